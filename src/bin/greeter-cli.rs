use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;

use greeter_gateway::rpc::proto::greeter_client::GreeterClient;
use greeter_gateway::rpc::proto::{Empty, HelloRequest, UserReq};

#[derive(Parser)]
#[command(name = "greeter-cli")]
#[command(about = "Call the Greeter service over gRPC or the HTTP/JSON gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8091")]
    url: String,

    #[arg(short, long, value_enum, default_value_t = Transport::Http)]
    transport: Transport,

    /// Continue an existing trace (W3C traceparent value)
    #[arg(long)]
    traceparent: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Transport {
    /// Native gRPC over HTTP/2
    Grpc,
    /// JSON through the gateway
    Http,
}

#[derive(Subcommand)]
enum Commands {
    /// Say hello
    Hello { name: String },
    /// Log out
    Logout,
    /// Look up a user by id
    User { id: u64 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let json = match cli.transport {
        Transport::Grpc => call_grpc(&cli).await?,
        Transport::Http => call_http(&cli).await?,
    };
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn with_trace<T>(message: T, traceparent: Option<&str>) -> Result<tonic::Request<T>, Box<dyn std::error::Error>> {
    let mut request = tonic::Request::new(message);
    if let Some(value) = traceparent {
        request.metadata_mut().insert("traceparent", value.parse()?);
    }
    Ok(request)
}

async fn call_grpc(cli: &Cli) -> Result<Value, Box<dyn std::error::Error>> {
    let mut client = GreeterClient::connect(cli.url.clone()).await?;
    let traceparent = cli.traceparent.as_deref();
    let value = match &cli.command {
        Commands::Hello { name } => {
            let request = with_trace(HelloRequest { name: name.clone() }, traceparent)?;
            serde_json::to_value(client.say_hello(request).await?.into_inner())?
        }
        Commands::Logout => {
            let request = with_trace(Empty {}, traceparent)?;
            serde_json::to_value(client.logout(request).await?.into_inner())?
        }
        Commands::User { id } => {
            let request = with_trace(UserReq { id: *id }, traceparent)?;
            serde_json::to_value(client.get_user(request).await?.into_inner())?
        }
    };
    Ok(value)
}

async fn call_http(cli: &Cli) -> Result<Value, Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');
    let request = match &cli.command {
        Commands::Hello { name } => client
            .post(format!("{base}/v1/hello"))
            .json(&HelloRequest { name: name.clone() }),
        Commands::Logout => client.post(format!("{base}/v1/logout")).json(&Empty {}),
        Commands::User { id } => client.get(format!("{base}/v1/user/{id}")),
    };
    let request = match &cli.traceparent {
        Some(value) => request.header("traceparent", value),
        None => request,
    };

    let res = request.send().await?;
    let status = res.status();
    if let Some(trace_id) = res.headers().get("x-trace-id").and_then(|v| v.to_str().ok()) {
        eprintln!("trace id: {trace_id}");
    }
    let json: Value = res.json().await?;
    if !status.is_success() {
        eprintln!("Error: gateway returned status {status}");
    }
    Ok(json)
}
