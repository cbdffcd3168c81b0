//! Command-line interface for the Kuznyechik engines.

#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use kuznyechik_core::{
    block_from_slice, decrypt_block, encrypt_block, Block, Key256, Kuznyechik, RoundKeys,
    FULL_ROUNDS,
};
use kuznyechik_masked::leakage::{hamming_weight_trace, trace_unmasked, CpaCampaign};
use kuznyechik_masked::{
    seeded_chacha, MaskedKuznyechik, MaskingConfig, MaskingMode, TraceRecorder,
};
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Key the evaluation firmware loads at boot (GOST R 34.12-2015 example key).
const DEFAULT_KEY_HEX: &str = "8899aabbccddeeff0011223344556677fedcba98765432100123456789abcdef";

/// Kuznyechik CLI.
#[derive(Parser)]
#[command(
    name = "kuz",
    version,
    author,
    about = "Kuznyechik (GOST R 34.12-2015) CLI with a first-order masked engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EngineArgs {
    /// 256-bit key as 64 hex characters.
    #[arg(long, value_name = "HEX", default_value = DEFAULT_KEY_HEX)]
    key_hex: String,
    /// Use the masked engine.
    #[arg(long, default_value_t = false)]
    masked: bool,
    /// Seed masks from plaintext bytes 10, 11 and 14 (weak, firmware parity). Implies --masked.
    #[arg(long, default_value_t = false)]
    weak_mask: bool,
    /// Optional RNG seed for reproducible runs. Masks use a seed drawn from this stream.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt one 16-byte block.
    Enc {
        #[command(flatten)]
        engine: EngineArgs,
        /// Plaintext block as 32 hex characters.
        #[arg(long, value_name = "HEX")]
        block_hex: String,
    },
    /// Decrypt one 16-byte block.
    Dec {
        #[command(flatten)]
        engine: EngineArgs,
        /// Ciphertext block as 32 hex characters.
        #[arg(long, value_name = "HEX")]
        block_hex: String,
    },
    /// Print the ten round keys for a key.
    Schedule {
        /// 256-bit key as 64 hex characters.
        #[arg(long, value_name = "HEX", default_value = DEFAULT_KEY_HEX)]
        key_hex: String,
    },
    /// Verify the masked engine matches the plain engine on random samples.
    Check {
        /// 256-bit key as 64 hex characters.
        #[arg(long, value_name = "HEX", default_value = DEFAULT_KEY_HEX)]
        key_hex: String,
        /// Number of random samples to test.
        #[arg(long, default_value_t = 64)]
        samples: usize,
        /// Optional RNG seed for reproducibility.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Encrypt random plaintexts and write "plaintext ciphertext" hex lines to a file.
    Acquire {
        #[command(flatten)]
        engine: EngineArgs,
        /// Number of plaintext/ciphertext pairs.
        #[arg(long, default_value_t = 1000)]
        count: usize,
        /// Output path for the pairs.
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
    /// Simulate a correlation power analysis on the last round key from Hamming-weight leakage.
    Cpa {
        #[command(flatten)]
        engine: EngineArgs,
        /// Number of simulated traces.
        #[arg(long, default_value_t = 500)]
        traces: usize,
        /// Number of trailing round events kept as leakage points.
        #[arg(long, default_value_t = 5)]
        window: usize,
    },
    /// Run a local demo: random key and block, encrypt with the masked engine, decrypt back.
    Demo {
        /// Optional RNG seed for reproducibility.
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Plain or masked engine chosen on the command line.
enum Engine {
    Plain(Kuznyechik),
    Masked(MaskedKuznyechik),
}

impl Engine {
    /// Builds the engine. A masked engine is seeded from `rng`, never from the
    /// raw `--seed`, so its masks stay independent of anything else `rng` draws.
    fn from_args(args: &EngineArgs, rng: &mut impl RngCore) -> Result<Self> {
        let key = parse_key_hex(&args.key_hex)?;
        if !(args.masked || args.weak_mask) {
            return Ok(Self::Plain(Kuznyechik::new(&key)));
        }
        let config = MaskingConfig {
            mode: if args.weak_mask {
                MaskingMode::PlaintextSeeded
            } else {
                MaskingMode::Secure
            },
            seed: args.seed.map(|_| rng.next_u64()),
        };
        Ok(Self::Masked(MaskedKuznyechik::with_config(&key, &config)))
    }

    fn encrypt(&mut self, block: &mut Block) {
        match self {
            Self::Plain(engine) => engine.encrypt(block),
            Self::Masked(engine) => engine.encrypt(block),
        }
    }

    fn decrypt(&mut self, block: &mut Block) {
        match self {
            Self::Plain(engine) => engine.decrypt(block),
            Self::Masked(engine) => engine.decrypt(block),
        }
    }

    fn encrypt_traced(&mut self, block: &mut Block, recorder: &mut TraceRecorder) {
        match self {
            Self::Plain(engine) => *block = trace_unmasked(block, engine.round_keys(), recorder),
            Self::Masked(engine) => engine.encrypt_traced(block, recorder),
        }
    }

    fn round_keys(&self) -> &RoundKeys {
        match self {
            Self::Plain(engine) => engine.round_keys(),
            Self::Masked(engine) => engine.round_keys(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Enc { engine, block_hex } => cmd_enc(&engine, &block_hex),
        Commands::Dec { engine, block_hex } => cmd_dec(&engine, &block_hex),
        Commands::Schedule { key_hex } => cmd_schedule(&key_hex),
        Commands::Check {
            key_hex,
            samples,
            seed,
        } => cmd_check(&key_hex, samples, seed),
        Commands::Acquire { engine, count, out } => cmd_acquire(&engine, count, &out),
        Commands::Cpa {
            engine,
            traces,
            window,
        } => cmd_cpa(&engine, traces, window),
        Commands::Demo { seed } => cmd_demo(seed),
    }
}

fn cmd_enc(args: &EngineArgs, block_hex: &str) -> Result<()> {
    let mut engine = Engine::from_args(args, &mut seeded_rng(args.seed))?;
    let mut block = parse_block_hex(block_hex)?;
    engine.encrypt(&mut block);
    println!("{}", hex::encode(block));
    Ok(())
}

fn cmd_dec(args: &EngineArgs, block_hex: &str) -> Result<()> {
    let mut engine = Engine::from_args(args, &mut seeded_rng(args.seed))?;
    let mut block = parse_block_hex(block_hex)?;
    engine.decrypt(&mut block);
    println!("{}", hex::encode(block));
    Ok(())
}

fn cmd_schedule(key_hex: &str) -> Result<()> {
    let key = parse_key_hex(key_hex)?;
    let engine = Kuznyechik::new(&key);
    for (i, round_key) in engine.round_keys().0.iter().enumerate() {
        println!("K{}: {}", i + 1, hex::encode(round_key));
    }
    Ok(())
}

fn cmd_check(key_hex: &str, samples: usize, seed: Option<u64>) -> Result<()> {
    let key = parse_key_hex(key_hex)?;
    let plain = Kuznyechik::new(&key);
    let mut rng = seeded_rng(seed);

    for mode in [MaskingMode::Secure, MaskingMode::PlaintextSeeded] {
        let config = MaskingConfig {
            mode,
            seed: Some(rng.next_u64()),
        };
        let mut masked = MaskedKuznyechik::with_config(&key, &config);
        for _ in 0..samples {
            let mut block = [0u8; 16];
            rng.fill_bytes(&mut block);

            let mut expected = block;
            plain.encrypt(&mut expected);

            let mut actual = block;
            masked.encrypt(&mut actual);
            if actual != expected {
                bail!("{mode:?}: masked encryption differs from plain engine");
            }
            masked.decrypt(&mut actual);
            if actual != block {
                bail!("{mode:?}: masked decryption did not recover the plaintext");
            }
        }
    }
    println!("ok: {samples} samples per masking mode");
    Ok(())
}

fn cmd_acquire(args: &EngineArgs, count: usize, out: &Path) -> Result<()> {
    let mut rng = seeded_rng(args.seed);
    let mut engine = Engine::from_args(args, &mut rng)?;
    let pairs = acquire_pairs(&mut engine, &mut rng, count);
    fs::write(out, pairs).with_context(|| format!("write {}", out.display()))?;
    Ok(())
}

fn cmd_cpa(args: &EngineArgs, traces: usize, window: usize) -> Result<()> {
    let mut rng = seeded_rng(args.seed);
    let mut engine = Engine::from_args(args, &mut rng)?;
    let campaign = record_campaign(&mut engine, &mut rng, traces, window)?;
    let report = campaign.analyze().context("correlate traces")?;

    let last = *engine.round_keys().get(FULL_ROUNDS);
    println!("K10:        {}", hex::encode(last));
    println!("best guess: {}", hex::encode(report.best_key()));
    let entropy = report.guessing_entropy(&last);
    let ranks: Vec<String> = entropy.iter().map(|rank| rank.to_string()).collect();
    println!("partial guessing entropy: {}", ranks.join(" "));
    Ok(())
}

fn cmd_demo(seed: Option<u64>) -> Result<()> {
    let mut rng = seeded_rng(seed);
    let mut key_bytes = [0u8; 32];
    rng.fill_bytes(&mut key_bytes);
    let key = Key256::from(key_bytes);

    let config = MaskingConfig {
        mode: MaskingMode::Secure,
        seed: Some(rng.next_u64()),
    };
    let mut masked = MaskedKuznyechik::with_config(&key, &config);

    let mut block = [0u8; 16];
    rng.fill_bytes(&mut block);
    let plaintext = block;
    let plaintext_hex = hex::encode(block);

    masked.encrypt(&mut block);
    let ciphertext_hex = hex::encode(block);
    if block != encrypt_block(&plaintext, masked.round_keys()) {
        bail!("masked ciphertext differs from plain engine");
    }

    let decrypted = decrypt_block(&block, masked.round_keys());
    let decrypted_hex = hex::encode(decrypted);
    println!("demo key: {}", hex::encode(key_bytes));
    println!("plaintext: {}", plaintext_hex);
    println!("ciphertext: {}", ciphertext_hex);
    println!("decrypted: {}", decrypted_hex);
    if decrypted_hex != plaintext_hex {
        bail!("demo roundtrip failed");
    }
    Ok(())
}

fn acquire_pairs(engine: &mut Engine, rng: &mut impl RngCore, count: usize) -> String {
    let mut lines = String::with_capacity(count * 66);
    for _ in 0..count {
        let mut block = [0u8; 16];
        rng.fill_bytes(&mut block);
        let plaintext = block;
        engine.encrypt(&mut block);
        lines.push_str(&format!(
            "{} {}\n",
            hex::encode(plaintext),
            hex::encode(block)
        ));
    }
    lines
}

fn record_campaign(
    engine: &mut Engine,
    rng: &mut impl RngCore,
    count: usize,
    window: usize,
) -> Result<CpaCampaign> {
    let mut recorder = TraceRecorder::new();
    let mut campaign = CpaCampaign::new();
    for _ in 0..count {
        let mut block = [0u8; 16];
        rng.fill_bytes(&mut block);
        recorder.clear();
        engine.encrypt_traced(&mut block, &mut recorder);
        let samples = recorder.samples();
        let start = samples.len().saturating_sub(window);
        campaign.push(block, hamming_weight_trace(&samples[start..]))?;
    }
    Ok(campaign)
}

fn parse_key_hex(hex_str: &str) -> Result<Key256> {
    let bytes = hex::decode(hex_str.trim()).context("decode key hex")?;
    Key256::try_from(bytes.as_slice())
        .context("Kuznyechik key must be 32 bytes (64 hex characters)")
}

fn parse_block_hex(hex_str: &str) -> Result<Block> {
    let bytes = hex::decode(hex_str.trim()).context("decode block hex")?;
    block_from_slice(&bytes).context("block must be 16 bytes (32 hex characters)")
}

fn seeded_rng(seed: Option<u64>) -> impl RngCore + CryptoRng {
    match seed {
        Some(value) => seeded_chacha(value),
        None => {
            let mut seed_bytes = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut seed_bytes);
            ChaCha20Rng::from_seed(seed_bytes)
        }
    }
}
