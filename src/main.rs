#[macro_use]
extern crate async_trait;
extern crate chrono;
extern crate derive_more;
extern crate futures_util;
extern crate json;
#[macro_use]
extern crate lazy_static;
extern crate regex;
extern crate tokio;
extern crate urlparse;

/// Login, registration and bearer tokens
mod auth;
/// Users and tokens storage
mod db;
mod error;
/// Used to extend some thirdparty library
mod ext;
mod i18n;
mod log_cfg;
mod opthelper;
mod opts;
/// HTTP server
mod server;
mod settings;
mod settings_list;
mod utils;

pub use i18n::gettext;
use log::LevelFilter;
use opthelper::OptHelper;
use opts::Command;
use opts::CommandOpts;
use opts::ConfigCommand;
use server::context::ServerContext;
use server::service::start_server;
use server::timer::start_timer;
use settings::SettingStore;
use std::sync::Arc;

pub struct Main {
    pub cmd: Option<CommandOpts>,
    pub settings: Option<SettingStore>,
}

impl Main {
    pub fn deal_config_cmd(&self, cmd: &CommandOpts, settings: &SettingStore) -> i32 {
        match cmd.config_cmd {
            Some(ConfigCommand::Fix) => match cmd.config() {
                Some(conf) => {
                    if settings.save(&conf) {
                        0
                    } else {
                        log::error!("{} {}", gettext("Failed to save config file:"), conf);
                        1
                    }
                }
                None => 0,
            },
            Some(ConfigCommand::Help) => {
                println!("{}", gettext("All available settings:"));
                settings.basic.print_help();
                0
            }
            None => 1,
        }
    }

    pub fn new() -> Self {
        Self {
            cmd: None,
            settings: None,
        }
    }

    pub async fn run(&mut self) -> i32 {
        log_cfg::init_default();
        self.cmd = opts::parse_cmd();
        let cmd = match self.cmd.as_ref() {
            Some(cmd) => cmd,
            None => return 1,
        };
        if cmd.verbose {
            log_cfg::init_with_level(LevelFilter::Debug);
        }
        let mut settings = SettingStore::default();
        if let Some(conf) = cmd.config() {
            let fix_invalid =
                cmd.cmd == Command::Config && cmd.config_cmd == Some(ConfigCommand::Fix);
            if !settings.read(&conf, fix_invalid) {
                log::error!("{} {}", gettext("Can not read config file:"), conf.as_str());
                return 1;
            }
        }
        self.settings.replace(settings);
        let (cmd, settings) = match (self.cmd.as_ref(), self.settings.as_ref()) {
            (Some(cmd), Some(settings)) => (cmd, settings),
            _ => return 1,
        };
        match cmd.cmd {
            Command::Config => self.deal_config_cmd(cmd, settings),
            Command::Server => self.server(cmd, settings).await,
            Command::None => 0,
        }
    }

    pub async fn server(&self, cmd: &CommandOpts, settings: &SettingStore) -> i32 {
        let helper = OptHelper::new(cmd, settings);
        let ctx = match ServerContext::from_helper(&helper).await {
            Ok(ctx) => Arc::new(ctx),
            Err(e) => {
                log::error!("{}", e);
                return 1;
            }
        };
        let addr = helper.server();
        let server = match start_server(&addr, Arc::clone(&ctx)) {
            Ok(server) => server,
            Err(e) => {
                log::error!("{} {}", gettext("Failed to start server:"), e);
                return 1;
            }
        };
        let interval = helper.token_sweep_interval();
        if interval > 0 {
            tokio::spawn(start_timer(Arc::clone(&ctx), interval));
        }
        log::info!("{} http://{}", gettext("Listening on"), addr);
        match server.await {
            Ok(_) => 0,
            Err(e) => {
                log::error!("{} {}", gettext("Server error:"), e);
                1
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let mut m = Main::new();
    std::process::exit(m.run().await);
}
