//! Playground Core Tool
//!
//! Command line access to the SDK codecs and random source, for inspecting
//! credential strings, cipher blocks and saved RNG state.

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use playground::{
    codec::base64,
    config::AppConfig,
    Blowfish, CredentialCipher, MersenneTwister, VERSION,
};

#[derive(Parser, Debug)]
#[command(name = "playground")]
#[command(about = "Playground SDK core: Base64, Blowfish and Mersenne Twister tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Base64 encode or decode text
    Base64 {
        #[command(subcommand)]
        action: Base64Action,
    },

    /// Encrypt or decrypt hex data with Blowfish (ECB, 8-byte blocks)
    Blowfish {
        #[command(subcommand)]
        action: BlowfishAction,
    },

    /// Seal or open a credential string
    Credential {
        #[command(subcommand)]
        action: CredentialAction,
    },

    /// Print random draws
    Rng {
        /// Seed (defaults to PLAYGROUND_SEED, then 5489)
        #[arg(long)]
        seed: Option<u32>,

        /// Number of draws
        #[arg(long, default_value_t = 10)]
        count: usize,

        /// Draw integers in [LO, HI] instead of raw 32-bit words
        #[arg(long, num_args = 2, value_names = ["LO", "HI"], allow_hyphen_values = true)]
        range: Option<Vec<i32>>,

        /// Print the draws as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the saved generator state as Base64
    RngState {
        /// Seed (defaults to PLAYGROUND_SEED, then 5489)
        #[arg(long)]
        seed: Option<u32>,

        /// Draws to discard before saving
        #[arg(long, default_value_t = 0)]
        skip: usize,
    },
}

#[derive(Subcommand, Debug)]
enum Base64Action {
    /// Encode text
    Encode { text: String },
    /// Decode text
    Decode { text: String },
}

#[derive(Subcommand, Debug)]
enum BlowfishAction {
    /// Encrypt hex data
    Encrypt {
        /// Key as hex (1 to 56 bytes)
        #[arg(long)]
        key: String,
        /// Plaintext as hex, a multiple of 8 bytes
        data: String,
    },
    /// Decrypt hex data
    Decrypt {
        /// Key as hex (1 to 56 bytes)
        #[arg(long)]
        key: String,
        /// Ciphertext as hex, a multiple of 8 bytes
        data: String,
    },
}

#[derive(Subcommand, Debug)]
enum CredentialAction {
    /// Encrypt a credential to Base64 text
    Seal {
        /// Key as hex (defaults to PLAYGROUND_CREDENTIAL_KEY)
        #[arg(long)]
        key: Option<String>,
        text: String,
    },
    /// Decrypt Base64 text to the credential
    Open {
        /// Key as hex (defaults to PLAYGROUND_CREDENTIAL_KEY)
        #[arg(long)]
        key: Option<String>,
        text: String,
    },
}

/// JSON report for `rng --json`.
#[derive(Serialize)]
struct DrawReport {
    seed: u32,
    range: Option<(i32, i32)>,
    values: Vec<i64>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env().context("Failed to read configuration")?;

    // Initialize logging
    let filter = EnvFilter::try_new(&config.log_filter)
        .with_context(|| format!("Invalid log filter: {}", config.log_filter))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    debug!("Playground core v{}", VERSION);

    match cli.command {
        Commands::Base64 { action } => cmd_base64(action)?,
        Commands::Blowfish { action } => cmd_blowfish(action)?,
        Commands::Credential { action } => cmd_credential(action, &config)?,
        Commands::Rng {
            seed,
            count,
            range,
            json,
        } => cmd_rng(resolve_seed(seed, &config), count, range, json)?,
        Commands::RngState { seed, skip } => cmd_rng_state(resolve_seed(seed, &config), skip)?,
    }

    Ok(())
}

fn cmd_base64(action: Base64Action) -> Result<()> {
    match action {
        Base64Action::Encode { text } => {
            println!("{}", base64::encode(text.as_bytes()));
        }
        Base64Action::Decode { text } => {
            let bytes = base64::decode(&text).context("Failed to decode Base64")?;
            match String::from_utf8(bytes) {
                Ok(s) => println!("{}", s),
                Err(e) => println!("{}", hex::encode(e.into_bytes())),
            }
        }
    }
    Ok(())
}

fn cmd_blowfish(action: BlowfishAction) -> Result<()> {
    let (key, data, encrypt) = match action {
        BlowfishAction::Encrypt { key, data } => (key, data, true),
        BlowfishAction::Decrypt { key, data } => (key, data, false),
    };

    let key = hex::decode(key.trim()).context("Key is not valid hex")?;
    let data = hex::decode(data.trim()).context("Data is not valid hex")?;
    let cipher = Blowfish::new(&key).context("Failed to expand key")?;

    let out = if encrypt {
        cipher.encrypt_bytes(&data)
    } else {
        cipher.decrypt_bytes(&data)
    }
    .context("Blowfish operation failed")?;

    println!("{}", hex::encode(out));
    Ok(())
}

fn cmd_credential(action: CredentialAction, config: &AppConfig) -> Result<()> {
    let (key, text, seal) = match action {
        CredentialAction::Seal { key, text } => (key, text, true),
        CredentialAction::Open { key, text } => (key, text, false),
    };

    let key = resolve_key(key, config)?;
    let creds = CredentialCipher::new(&key).context("Failed to expand key")?;

    let out = if seal {
        creds.seal(&text).context("Failed to seal credential")?
    } else {
        creds.open(&text).context("Failed to open credential")?
    };

    println!("{}", out);
    Ok(())
}

fn cmd_rng(seed: u32, count: usize, range: Option<Vec<i32>>, json: bool) -> Result<()> {
    let range = parse_range(range)?;

    info!(seed, count, "drawing random values");
    let report = draw(seed, count, range);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize draws")?
        );
    } else {
        for value in report.values {
            println!("{}", value);
        }
    }
    Ok(())
}

fn cmd_rng_state(seed: u32, skip: usize) -> Result<()> {
    let mut rng = MersenneTwister::with_seed(seed);
    for _ in 0..skip {
        rng.rand32();
    }
    println!("{}", base64::encode(&rng.state_bytes()));
    Ok(())
}

/// Seed flag, falling back to the configured default.
fn resolve_seed(flag: Option<u32>, config: &AppConfig) -> u32 {
    flag.unwrap_or(config.default_seed)
}

/// Key flag as hex, falling back to the configured credential key.
fn resolve_key(flag: Option<String>, config: &AppConfig) -> Result<Vec<u8>> {
    match flag {
        Some(k) => hex::decode(k.trim()).context("Key is not valid hex"),
        None => config
            .credential_key
            .clone()
            .context("No key given and PLAYGROUND_CREDENTIAL_KEY is not set"),
    }
}

fn parse_range(range: Option<Vec<i32>>) -> Result<Option<(i32, i32)>> {
    match range.as_deref() {
        Some(&[lo, hi]) => {
            ensure!(lo <= hi, "Range lower bound {} exceeds upper bound {}", lo, hi);
            Ok(Some((lo, hi)))
        }
        Some(other) => anyhow::bail!("Range takes two values, got {}", other.len()),
        None => Ok(None),
    }
}

fn draw(seed: u32, count: usize, range: Option<(i32, i32)>) -> DrawReport {
    let mut rng = MersenneTwister::with_seed(seed);
    let values = (0..count)
        .map(|_| match range {
            Some((lo, hi)) => rng.rand_range(lo, hi) as i64,
            None => rng.rand32() as i64,
        })
        .collect();
    DrawReport {
        seed,
        range,
        values,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use playground::config::{ENV_CREDENTIAL_KEY, ENV_SEED};

    fn config_from(pairs: &[(&'static str, &'static str)]) -> AppConfig {
        let pairs = pairs.to_vec();
        AppConfig::from_lookup(move |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        })
        .unwrap()
    }

    fn rng_args(cli: Cli) -> (Option<u32>, usize, Option<Vec<i32>>, bool) {
        match cli.command {
            Commands::Rng {
                seed,
                count,
                range,
                json,
            } => (seed, count, range, json),
            other => panic!("expected rng command, got {:?}", other),
        }
    }

    #[test]
    fn test_seed_flag_beats_env() {
        let config = config_from(&[(ENV_SEED, "42")]);

        let cli = Cli::try_parse_from(["playground", "rng", "--seed", "7"]).unwrap();
        let (seed, _, _, _) = rng_args(cli);
        assert_eq!(resolve_seed(seed, &config), 7);

        let cli = Cli::try_parse_from(["playground", "rng"]).unwrap();
        let (seed, count, _, _) = rng_args(cli);
        assert_eq!(resolve_seed(seed, &config), 42);
        assert_eq!(count, 10);

        assert_eq!(resolve_seed(None, &config_from(&[])), 5489);
    }

    #[test]
    fn test_key_flag_beats_env() {
        let config = config_from(&[(ENV_CREDENTIAL_KEY, "706c617967726f756e64")]);
        let key = resolve_key(Some("0102".into()), &config).unwrap();
        assert_eq!(key, vec![1, 2]);
    }

    #[test]
    fn test_key_falls_back_to_env() {
        let config = config_from(&[(ENV_CREDENTIAL_KEY, "706c617967726f756e64")]);

        let cli = Cli::try_parse_from(["playground", "credential", "seal", "password"]).unwrap();
        let (key, text) = match cli.command {
            Commands::Credential {
                action: CredentialAction::Seal { key, text },
            } => (key, text),
            other => panic!("expected credential seal, got {:?}", other),
        };
        assert_eq!(key, None);

        let key = resolve_key(key, &config).unwrap();
        assert_eq!(key, b"playground");
        let sealed = CredentialCipher::new(&key).unwrap().seal(&text).unwrap();
        assert_eq!(sealed, "7MnAoCJ+Uig=");
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let err = resolve_key(None, &config_from(&[])).unwrap_err();
        assert!(err.to_string().contains("PLAYGROUND_CREDENTIAL_KEY"));

        assert!(resolve_key(Some("zz".into()), &config_from(&[])).is_err());
    }

    #[test]
    fn test_range_parsing() {
        let cli = Cli::try_parse_from(["playground", "rng", "--range", "3", "2"]).unwrap();
        let (_, _, range, _) = rng_args(cli);
        let err = parse_range(range).unwrap_err();
        assert!(err.to_string().contains("exceeds upper bound"));

        let cli = Cli::try_parse_from(["playground", "rng", "--range", "-5", "5"]).unwrap();
        let (_, _, range, _) = rng_args(cli);
        assert_eq!(parse_range(range).unwrap(), Some((-5, 5)));

        assert!(Cli::try_parse_from(["playground", "rng", "--range", "3"]).is_err());
        assert_eq!(parse_range(None).unwrap(), None);
    }

    #[test]
    fn test_json_report_shape() {
        let cli =
            Cli::try_parse_from(["playground", "rng", "--seed", "1", "--count", "3", "--json"])
                .unwrap();
        let (seed, count, range, json) = rng_args(cli);
        assert!(json);

        let seed = resolve_seed(seed, &config_from(&[]));
        let report = draw(seed, count, parse_range(range).unwrap());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "seed": 1,
                "range": null,
                "values": [1791095845u32, 4282876139u32, 3093770124u32],
            })
        );

        let report = draw(1, 50, Some((-3, 3)));
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["range"], serde_json::json!([-3, 3]));
        let values = value["values"].as_array().unwrap();
        assert_eq!(values.len(), 50);
        assert!(values.iter().all(|v| (-3..=3).contains(&v.as_i64().unwrap())));
    }
}
