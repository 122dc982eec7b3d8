use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match backend::start_server().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("Server failed: {error}");
            eprintln!("todo-server: {error}");
            ExitCode::FAILURE
        }
    }
}
