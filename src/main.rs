extern crate slack_driver as slack;

use std::env;
use std::time::Duration;

use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use slack::{Client, Context};

fn main() {
    dotenv().ok();

    if let Err(e) = fmt().with_env_filter(EnvFilter::from_default_env()).try_init() {
        eprintln!("tracing init failed: {}", e);
    }

    let token = env::var("SLACK_TOKEN").expect("SLACK_TOKEN must be set");
    let client = match env::var("SLACK_API_URL") {
        Ok(url) => {
            let url = url.parse().expect("SLACK_API_URL is invalid");
            Client::with_base_url(token, url).expect("SLACK_API_URL is not https")
        }
        Err(_) => Client::new(token).expect("default API url is valid"),
    };
    let ctx = match env::var("SLACK_TIMEOUT_SECS") {
        Ok(secs) => {
            let secs = secs.parse().expect("SLACK_TIMEOUT_SECS must be a number");
            Context::with_timeout(Duration::from_secs(secs))
        }
        Err(_) => Context::background(),
    };

    let mut rt = tokio::runtime::Runtime::new().unwrap();

    match rt.block_on(client.get_team_info(&ctx)) {
        Ok(team) => {
            info!(team = %team.id, "fetched team info");
            println!("{:#?}", team);
        }
        Err(err) => {
            error!(error = %err, "team.info failed");
            std::process::exit(1);
        }
    }
}
