// src/main.rs

use dagmake::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.effective_log_level(), args.log_file()) {
        eprintln!("dagmake error: {err:?}");
        std::process::exit(1);
    }

    if let Err(err) = run(args).await {
        tracing::error!("{err}");
        if let dagmake::errors::DagmakeError::CyclicDependency { chain, .. } = &err {
            for path in chain {
                tracing::error!("  -> {}", path.display());
            }
        }
        std::process::exit(err.exit_code());
    }
}
