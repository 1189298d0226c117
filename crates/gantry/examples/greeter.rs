//! A gateway-only service: `POST /v1/greet/{name}` answers with JSON.
//!
//! ```text
//! cargo run -p gantry --example greeter
//! curl -X POST localhost:8080/v1/greet/ada -d '{"greeting":"Hi"}'
//! ```

use gantry::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct GreetRequest {
    name: String,
    #[serde(default)]
    greeting: Option<String>,
}

#[derive(Debug, Serialize)]
struct GreetReply {
    message: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::new()
        .with_development()
        .with_optional_file("gantry.toml")?
        .with_dotenv()?
        .with_env_prefix("GANTRY")
        .load()?;

    let _log = init_logging(&gantry::bootstrap::log_config(&config))?;
    let app = App::new(gantry::bootstrap::server_config(&config)?);

    app.gateway().handle_json(
        http::Method::POST,
        "/v1/greet/{name}",
        |req: GreetRequest| async move {
            if req.name.is_empty() {
                return Err(tonic::Status::invalid_argument("name is required"));
            }
            let greeting = req.greeting.unwrap_or_else(|| "Hello".to_string());
            Ok(GreetReply {
                message: format!("{greeting}, {}!", req.name),
            })
        },
    )?;

    app.start().await;
    Ok(())
}
