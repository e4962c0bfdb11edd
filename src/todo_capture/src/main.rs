mod capture_server;
mod views;

use log::error;
use std::env;
use std::net::SocketAddr;

use crate::capture_server::{run_capture_server, CaptureRunOptions};

fn usage() -> String {
    format!(
        "usage: todo_capture [--listen <addr>]\n\
         required environment: {} {} {} {}\n\
         optional environment: {} {} {} {} {}",
        todo_lib::ENV_GITHUB_TOKEN,
        todo_lib::ENV_REPO_OWNER,
        todo_lib::ENV_REPO_NAME,
        todo_lib::ENV_FILE_PATH,
        todo_lib::ENV_GITHUB_API_URL,
        todo_lib::ENV_REPO_BRANCH,
        todo_lib::ENV_COMMIT_MESSAGE,
        todo_lib::ENV_STORE_TIMEOUT_SECS,
        todo_lib::ENV_LISTEN_ADDR
    )
}

fn parse_args(args: &[String]) -> Result<CaptureRunOptions, String> {
    let mut options = CaptureRunOptions::default();

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Err(usage()),
            "--listen" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| "missing value for --listen".to_string())?;
                let addr = value
                    .parse::<SocketAddr>()
                    .map_err(|e| format!("invalid --listen address {}: {}", value, e))?;
                options.listen_addr = Some(addr);
            }
            other => {
                return Err(format!("unknown argument: {}\n{}", other, usage()));
            }
        }
        i += 1;
    }

    Ok(options)
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = env::args().skip(1).collect::<Vec<String>>();
    let options = match parse_args(&args) {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{}", msg);
            std::process::exit(1);
        }
    };

    if let Err(err) = run_capture_server(options).await {
        error!("run todo_capture failed: {}", err);
        std::process::exit(1);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args_defaults() {
        let options = parse_args(&[]).unwrap();
        assert!(options.listen_addr.is_none());
    }

    #[test]
    fn test_parse_args_listen() {
        let options = parse_args(&args(&["--listen", "127.0.0.1:9090"])).unwrap();
        assert_eq!(options.listen_addr, Some("127.0.0.1:9090".parse().unwrap()));
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&args(&["--listen"])).is_err());
        assert!(parse_args(&args(&["--listen", "nowhere"])).is_err());
        assert!(parse_args(&args(&["--mount", "/tmp"])).is_err());
        assert!(parse_args(&args(&["--help"])).unwrap_err().starts_with("usage:"));
    }
}
