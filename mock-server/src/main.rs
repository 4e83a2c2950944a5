use mock_server::Credentials;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let defaults = Credentials::default();
    let credentials = Credentials {
        email: std::env::var("MOCK_EMAIL").unwrap_or(defaults.email),
        password: std::env::var("MOCK_PASSWORD").unwrap_or(defaults.password),
    };

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, email = %credentials.email, "mock backend listening");
    mock_server::run_with(listener, credentials).await
}
