use serde_derive::Deserialize;
use sensor_manager_api::Error;
use std::env;
use tracing::Level;

fn def_log_level() -> String {
    String::from("warn")
}

fn def_registry_capacity() -> usize {
    32
}

fn def_request_capacity() -> usize {
    256
}

fn def_channel_capacity() -> usize {
    64
}

#[derive(Deserialize)]
pub struct Config {
    #[serde(default = "def_log_level")]
    log_level: String,
    /// Maximum number of sensors that can be registered at once. Must
    /// fit in the registry's single-word free-slot bitmap (<= 64).
    #[serde(default = "def_registry_capacity")]
    pub registry_capacity: usize,
    /// Maximum number of live client requests across all sensors.
    #[serde(default = "def_request_capacity")]
    pub request_capacity: usize,
    /// Bound on the manager task's inbound message channel.
    #[serde(default = "def_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default)]
    pub sensor: Vec<SensorSpec>,
}

impl Config {
    pub fn get_log_level(&self) -> Level {
        match self.log_level.as_str() {
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::WARN,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: def_log_level(),
            registry_capacity: def_registry_capacity(),
            request_capacity: def_request_capacity(),
            channel_capacity: def_channel_capacity(),
            sensor: vec![],
        }
    }
}

#[derive(Deserialize, Clone)]
pub enum SensorKind {
    #[serde(rename = "in-process")]
    InProcess,
    #[serde(rename = "out-of-process")]
    OutOfProcess,
}

#[derive(Deserialize, Clone)]
pub struct SensorSpec {
    pub name: String,
    pub sensor_type: String,
    pub supported_rates: Vec<u32>,
    pub kind: SensorKind,
}

fn from_cmdline(mut cfg: Config) -> (bool, Config) {
    use clap::{crate_version, Arg, ArgAction, Command};

    let matches = Command::new("Sensor Manager")
        .version(crate_version!())
        .about("Arbitrates sensor rate/latency subscriptions on a sensor hub.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .action(ArgAction::Set)
                .value_name("FILE")
                .help("Specifies the configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Sets verbosity of log; can be used more than once"),
        )
        .arg(
            Arg::new("print_cfg")
                .long("print-config")
                .action(ArgAction::SetTrue)
                .help("Displays the configuration and exits"),
        )
        .get_matches();

    match matches.get_count("verbose") {
        0 => (),
        1 => cfg.log_level = String::from("info"),
        2 => cfg.log_level = String::from("debug"),
        _ => cfg.log_level = String::from("trace"),
    };

    (matches.get_flag("print_cfg"), cfg)
}

fn parse_config(contents: &str) -> Result<Config, Error> {
    toml::from_str(contents)
        .map_err(|e| Error::InvArgument(format!("{}", e)))
        .and_then(|cfg: Config| {
            if cfg.registry_capacity == 0 || cfg.registry_capacity > 64 {
                return Err(Error::InvArgument(
                    "'registry_capacity' must be between 1 and 64".into(),
                ));
            }
            for spec in &cfg.sensor {
                if spec.supported_rates.is_empty() {
                    return Err(Error::InvArgument(format!(
                        "sensor '{}' has an empty supported_rates list",
                        spec.name
                    )));
                }
            }
            Ok(cfg)
        })
}

async fn from_file(path: &str) -> Option<Result<Config, Error>> {
    use tokio::fs;

    if let Ok(contents) = fs::read(path).await {
        let contents = String::from_utf8_lossy(&contents);

        Some(parse_config(&contents))
    } else {
        None
    }
}

async fn find_cfg() -> Result<Config, Error> {
    const CFG_FILE: &str = "sensor-managerd.toml";

    let mut dirs = vec![String::from("./")];

    if let Ok(home) = env::var("HOME") {
        dirs.push(format!("{}/.", home))
    }

    dirs.push(String::from("/usr/local/etc/"));
    dirs.push(String::from("/etc/"));

    for dir in dirs {
        let file = format!("{}{}", &dir, CFG_FILE);

        if let Some(cfg) = from_file(&file).await {
            return cfg;
        }
    }
    Ok(Config::default())
}

fn dump_config(cfg: &Config) {
    println!("Configuration:");
    println!("    log level: {}", cfg.get_log_level());
    println!("    registry capacity: {}", cfg.registry_capacity);
    println!("    request capacity: {}\n", cfg.request_capacity);

    println!("Sensors:");
    if !cfg.sensor.is_empty() {
        for s in &cfg.sensor {
            println!(
                "    name: {}\n    type: {}\n    rates: {:?}\n",
                &s.name, &s.sensor_type, &s.supported_rates
            )
        }
    } else {
        println!("    No sensors specified.");
    }
}

#[tracing::instrument(name = "loading config")]
pub async fn get() -> Option<Config> {
    match find_cfg().await {
        Ok(cfg) => {
            let (print_cfg, cfg) = from_cmdline(cfg);

            if print_cfg {
                dump_config(&cfg);
                None
            } else {
                Some(cfg)
            }
        }
        Err(e) => {
            println!("{}", e);
            None
        }
    }
}
