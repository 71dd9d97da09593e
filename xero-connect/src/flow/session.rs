use url::Url;

/// Query parameters the consent screen appends to the redirect
pub const CALLBACK_PARAMS: [&str; 3] = ["code", "scope", "state"];

/// Transient data for one authorization attempt, discarded once the
/// exchange completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationSession {
    pub code: String,
    pub scope: Option<String>,
    pub state: Option<String>,
}

impl AuthorizationSession {
    /// Extract the callback parameters from a view address.
    ///
    /// Returns `None` when no (non-empty) `code` is present.
    pub fn from_address(address: &Url) -> Option<Self> {
        let mut code = None;
        let mut scope = None;
        let mut state = None;
        for (key, value) in address.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "scope" => scope = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                _ => {}
            }
        }

        code.filter(|c| !c.is_empty()).map(|code| Self {
            code,
            scope,
            state,
        })
    }
}

/// Exchange guard, owned by one coordinator instance
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Idle,
    Exchanging { code: String },
    Refreshing,
    Initiating,
    Done { code: String },
}

impl FlowState {
    /// Whether a document write of the coordinator is in flight
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            FlowState::Exchanging { .. } | FlowState::Refreshing | FlowState::Initiating
        )
    }
}

/// Copy of `address` without the one-time callback parameters
pub fn strip_callback_params(address: &Url) -> Url {
    strip_params(address, &CALLBACK_PARAMS)
}

pub(crate) fn strip_params(address: &Url, params: &[&str]) -> Url {
    let retained: Vec<(String, String)> = address
        .query_pairs()
        .filter(|(key, _)| !params.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut cleaned = address.clone();
    if retained.is_empty() {
        cleaned.set_query(None);
    } else {
        cleaned.query_pairs_mut().clear().extend_pairs(retained);
    }
    cleaned
}
