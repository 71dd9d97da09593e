use secrecy::SecretString;
use xero_api::{Client, Request, XeroApiError};

#[tokio::main]
pub async fn main() -> Result<(), XeroApiError> {
    let token = std::env::var("XERO_ACCESS_TOKEN").unwrap_or_default();
    let client = Client::new(&SecretString::from(token));

    let req = Request::connections().list();

    let connections = client.send(req).await?;
    for connection in connections {
        println!(
            "{} {}",
            connection.tenant_id,
            connection.tenant_name.unwrap_or_default()
        );
    }
    Ok(())
}
