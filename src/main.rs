use queue_enroller::cli::{Args, Runner};
use queue_enroller::logging::{Logger, init_tracing};

#[tokio::main]
async fn main() {
    let args = Args::parse_args();
    init_tracing(args.verbose);

    let runner = Runner::new(args);
    if let Err(e) = runner.run().await {
        Logger::new(false).error(&e.to_string());
        std::process::exit(1);
    }
}
