use super::TenantType;
use crate::macros::setter;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tower_api_client::{Request, RequestData};
use uuid::Uuid;

// Common

/// A tenant the current access token has been granted access to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: Uuid,
    /// Identifies the consent flow that created this connection
    pub auth_event_id: Option<Uuid>,
    pub tenant_id: Uuid,
    pub tenant_type: TenantType,
    pub tenant_name: Option<String>,
    pub created_date_utc: Option<NaiveDateTime>,
    pub updated_date_utc: Option<NaiveDateTime>,
}

// Requests

#[derive(Default, Debug, Clone, Serialize)]
pub struct ListConnections {
    #[serde(rename = "authEventId", skip_serializing_if = "Option::is_none")]
    auth_event_id: Option<Uuid>,
}

impl ListConnections {
    pub fn new() -> Self {
        Self::default()
    }

    setter!(opt auth_event_id: Uuid);
}

impl Request for ListConnections {
    type Data = Self;
    type Response = Vec<Connection>;

    fn endpoint(&self) -> Cow<'_, str> {
        "/connections".into()
    }

    fn data(&self) -> RequestData<&Self> {
        if self.auth_event_id.is_some() {
            RequestData::Query(self)
        } else {
            RequestData::Empty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_connections_payload() {
        let body = r#"[
            {
                "id": "e1eede29-f875-4a5d-8470-17f6a29a88b1",
                "authEventId": "d99ecdfe-391d-43d2-b834-17636ba90e8d",
                "tenantId": "70784a63-d24b-46a9-a4db-0e70a274b056",
                "tenantType": "ORGANISATION",
                "tenantName": "Maple Florists Ltd",
                "createdDateUtc": "2019-07-09T23:40:30.1833130",
                "updatedDateUtc": "2020-05-15T01:35:13.8491980"
            }
        ]"#;

        let connections: Vec<Connection> = serde_json::from_str(body).unwrap();
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].tenant_type, TenantType::Organisation);
        assert_eq!(
            connections[0].tenant_name.as_deref(),
            Some("Maple Florists Ltd")
        );
    }

    #[test]
    fn unknown_tenant_type_is_other() {
        let tenant_type: TenantType = serde_json::from_str(r#""WORKFLOWMAX""#).unwrap();
        assert_eq!(tenant_type, TenantType::Other);
    }

    #[test]
    fn auth_event_filter_only_sent_when_set() {
        let unfiltered = ListConnections::new();
        assert!(matches!(unfiltered.data(), RequestData::Empty));

        let filtered = ListConnections::new().auth_event_id(Uuid::nil());
        assert!(matches!(filtered.data(), RequestData::Query(_)));
        assert_eq!(filtered.endpoint(), "/connections");
    }
}
