use crate::gettext;
use crate::utils::check_file_exists;
use crate::utils::get_exe_path_else_current;
use getopts::Options;
use std::env;
use std::net::SocketAddr;
use std::num::ParseIntError;
use std::str::FromStr;

/// Command Line command
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Do something for the config
    Config,
    /// Run as a server
    Server,
    /// Already handled when parsing options, just need return 0.
    None,
}

/// Subcommand for config
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigCommand {
    /// Fix the config file
    Fix,
    /// Print all available settings
    Help,
}

#[derive(Clone, Debug)]
/// Command Line Options
pub struct CommandOpts {
    /// Command
    pub cmd: Command,
    /// Config location
    pub _config: Option<String>,
    /// Config command
    pub config_cmd: Option<ConfigCommand>,
    /// Verbose logging
    pub verbose: bool,
    /// Server listen address
    pub server: Option<SocketAddr>,
    /// Domain attribute of issued cookies
    pub cookie_domain: Option<String>,
    /// Interval in seconds between two expired token sweeps. 0 disables the sweep.
    pub token_sweep_interval: Option<u64>,
}

impl CommandOpts {
    pub fn new(cmd: Command) -> Self {
        Self {
            cmd,
            _config: None,
            config_cmd: None,
            verbose: false,
            server: None,
            cookie_domain: None,
            token_sweep_interval: None,
        }
    }

    pub fn new_with_command<S: AsRef<str> + ?Sized>(cmd: &S) -> Option<Self> {
        let cmd = cmd.as_ref();
        if cmd == "config" {
            return Some(CommandOpts::new(Command::Config));
        }
        if cmd == "server" || cmd == "s" {
            return Some(CommandOpts::new(Command::Server));
        }
        None
    }

    /// The config file to use, if any exists
    pub fn config(&self) -> Option<String> {
        match &self._config {
            Some(config) => {
                if check_file_exists(config) {
                    Some(config.clone())
                } else {
                    log::error!(
                        "{}",
                        gettext("Warning: The specified config file not found.")
                    );
                    None
                }
            }
            None => {
                let pb = get_exe_path_else_current().join("tokenauth.json");
                if pb.exists() {
                    if let Some(s) = pb.to_str() {
                        return Some(s.to_owned());
                    }
                }
                if check_file_exists("config.json") {
                    return Some(String::from("config.json"));
                }
                None
            }
        }
    }
}

pub fn print_usage(prog: &str, opts: &Options) {
    let brief = format!(
        "{}
{} server/s [options] [address]  {}
{} config fix [options] {}
{} config help [options] {}",
        gettext("Usage:"),
        prog,
        gettext("Run the authentication server"),
        prog,
        gettext("Fix the config file"),
        prog,
        gettext("Print all available settings"),
    );
    println!("{}", opts.usage(brief.as_str()));
}

pub fn parse_u64<T: AsRef<str>>(s: Option<T>) -> Result<Option<u64>, ParseIntError> {
    match s {
        Some(s) => {
            let s = s.as_ref();
            let c = s.trim().parse::<u64>()?;
            Ok(Some(c))
        }
        None => Ok(None),
    }
}

fn build_options() -> Options {
    let mut opts = Options::new();
    opts.optflag("h", "help", gettext("Print help message."));
    opts.optopt(
        "c",
        "config",
        gettext("The location of config file."),
        "FILE",
    );
    opts.optflag("v", "verbose", gettext("Verbose logging."));
    opts.optopt(
        "",
        "cookie-domain",
        gettext("The domain attribute of issued cookies."),
        "DOMAIN",
    );
    opts.optopt(
        "",
        "token-sweep-interval",
        &format!(
            "{} ({} {})",
            gettext("Interval in seconds between two expired token sweeps. 0 disables it."),
            gettext("Default:"),
            3600
        ),
        "SECS",
    );
    opts
}

pub fn parse_cmd() -> Option<CommandOpts> {
    let argv: Vec<String> = env::args().collect();
    parse_cmd_from(&argv)
}

/// Parse a full argument list. The first item is the program name.
pub fn parse_cmd_from(argv: &[String]) -> Option<CommandOpts> {
    let opts = build_options();
    let prog = argv.first().map(|s| s.as_str()).unwrap_or("tokenauth");
    let result = match opts.parse(argv.iter().skip(1)) {
        Ok(m) => m,
        Err(err) => {
            log::error!("{}", err.to_string());
            return None;
        }
    };
    if result.opt_present("h") || result.free.len() == 0 {
        print_usage(prog, &opts);
        return Some(CommandOpts::new(Command::None));
    }
    let mut re = match CommandOpts::new_with_command(&result.free[0]) {
        Some(re) => re,
        None => {
            log::error!("{}", gettext("Unknown command."));
            print_usage(prog, &opts);
            return None;
        }
    };
    match re.cmd {
        Command::Config => {
            if result.free.len() < 2 {
                log::error!("{}", gettext("No detailed command specified."));
                print_usage(prog, &opts);
                return None;
            }
            let subcmd = &result.free[1];
            re.config_cmd = if subcmd == "fix" {
                Some(ConfigCommand::Fix)
            } else if subcmd == "help" {
                Some(ConfigCommand::Help)
            } else {
                None
            };
            if re.config_cmd.is_none() {
                log::error!("{}", gettext("Unknown config subcommand."));
                print_usage(prog, &opts);
                return None;
            }
        }
        Command::Server => {
            if result.free.len() >= 2 {
                let address = &result.free[1];
                match SocketAddr::from_str(address) {
                    Ok(address) => re.server = Some(address),
                    Err(e) => {
                        log::error!("{} {}", gettext("Failed to parse address:"), e);
                        return None;
                    }
                }
            }
        }
        Command::None => {}
    }
    re._config = result.opt_str("config");
    re.verbose = result.opt_present("verbose");
    re.cookie_domain = result.opt_str("cookie-domain");
    match parse_u64(result.opt_str("token-sweep-interval")) {
        Ok(r) => {
            re.token_sweep_interval = r;
        }
        Err(e) => {
            log::error!(
                "{} {}",
                gettext("Failed to parse <opt>:").replace("<opt>", "token-sweep-interval"),
                e
            );
            return None;
        }
    }
    Some(re)
}

#[cfg(test)]
fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_parse_cmd() {
    let re = parse_cmd_from(&args(&["tokenauth", "s", "0.0.0.0:9000", "-v"])).unwrap();
    assert_eq!(re.cmd, Command::Server);
    assert_eq!(re.server, Some(SocketAddr::from_str("0.0.0.0:9000").unwrap()));
    assert!(re.verbose);
    let re = parse_cmd_from(&args(&[
        "tokenauth",
        "server",
        "--cookie-domain",
        "example.com",
        "--token-sweep-interval",
        "60",
    ]))
    .unwrap();
    assert_eq!(re.server, None);
    assert_eq!(re.cookie_domain.as_deref(), Some("example.com"));
    assert_eq!(re.token_sweep_interval, Some(60));
    let re = parse_cmd_from(&args(&["tokenauth", "config", "help"])).unwrap();
    assert_eq!(re.cmd, Command::Config);
    assert_eq!(re.config_cmd, Some(ConfigCommand::Help));
    assert!(parse_cmd_from(&args(&["tokenauth", "config", "oops"])).is_none());
    assert!(parse_cmd_from(&args(&["tokenauth", "server", "not-an-address"])).is_none());
    assert!(parse_cmd_from(&args(&["tokenauth", "s", "--token-sweep-interval", "x"])).is_none());
    assert!(parse_cmd_from(&args(&["tokenauth", "download"])).is_none());
    assert_eq!(
        parse_cmd_from(&args(&["tokenauth"])).unwrap().cmd,
        Command::None
    );
}
