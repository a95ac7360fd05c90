// Command line interface module

use clap::Parser;

/// Web backend: template pages plus a generic JSON dispatch endpoint
#[derive(Debug, Parser)]
#[command(name = "appserver", version, about)]
pub struct Cli {
    /// Config file stem (TOML, extension optional)
    #[arg(short, long, default_value = "config")]
    pub config: String,

    /// Bind IP address (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port number (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Debug mode: log level debug, header logging on
    #[arg(short, long)]
    pub debug: bool,

    /// Error log file path
    #[arg(short = 'l', long)]
    pub log_file: Option<String>,

    /// Log level (error, warn, info, debug)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Quiet mode: disable access logging
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["appserver"]);
        assert_eq!(cli.config, "config");
        assert!(cli.host.is_none());
        assert!(cli.port.is_none());
        assert!(!cli.debug);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from(["appserver", "-p", "9000", "-d", "-q", "-l", "err.log"]);
        assert_eq!(cli.port, Some(9000));
        assert!(cli.debug);
        assert!(cli.quiet);
        assert_eq!(cli.log_file.as_deref(), Some("err.log"));
    }
}
