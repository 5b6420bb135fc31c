//! # Swap Runtime
//!
//! Drives cross-chain swaps between a Sepolia-like source chain and an
//! XRPL-testnet-like destination chain, both simulated in process. Swap
//! records are kept in a JSON store directory and survive the process.
//!
//! ## Startup Sequence
//!
//! 1. Load telemetry and swap configuration (from env)
//! 2. Open (and lock) the swap store
//! 3. Build both simulated chains on a shared clock
//! 4. Run the requested command
//!
//! By default the tokio clock is virtual: timelocks elapse as soon as every
//! task is idle. `--real-time` waits on the wall clock instead.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Instrument};

use htlc_swap::{
    Address, ChainId, EscrowLedger, Hash, JsonFileSwapStore, SimulatedChain, SwapApi, SwapConfig,
    SwapError, SwapOrchestrator, SwapRecord, SwapRequest, SwapStore, SystemTimeSource, TimeSource,
    TokioClock, Token,
};
use swap_telemetry::{init_telemetry, swap_span, TelemetryConfig};

/// xswap: cross-chain HTLC swaps over simulated chains
#[derive(Parser, Debug)]
#[command(name = "xswap")]
#[command(about = "Cross-chain HTLC swaps with commit-reveal, over simulated chains")]
struct Args {
    /// Swap store directory
    #[arg(short, long, default_value = "./xswap-store")]
    store: PathBuf,

    /// Wait on the wall clock instead of the virtual clock
    #[arg(long)]
    real_time: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one swap end to end
    Run {
        /// Source principal
        #[arg(long, default_value_t = 1_000)]
        src_amount: u128,
        /// Destination principal
        #[arg(long, default_value_t = 100)]
        dst_amount: u128,
        /// Source safety deposit
        #[arg(long, default_value_t = 10)]
        src_deposit: u128,
        /// Destination safety deposit
        #[arg(long, default_value_t = 5)]
        dst_deposit: u128,
    },
    /// Settle one order through several partial fills
    RunPartial {
        /// Order total on the source chain
        #[arg(long)]
        total_src: u128,
        /// Order total on the destination chain
        #[arg(long)]
        total_dst: u128,
        /// Fill as `SRC:DST`; repeat for each fill
        #[arg(long = "fill", value_parser = parse_fill, required = true)]
        fills: Vec<(u128, u128)>,
    },
    /// Fund the destination leg, abandon the swap and force-cancel it once
    /// the refund windows open
    ForceCancel {
        /// Source principal
        #[arg(long, default_value_t = 1_000)]
        src_amount: u128,
        /// Destination principal
        #[arg(long, default_value_t = 100)]
        dst_amount: u128,
    },
    /// Show stored swaps
    Status {
        /// Order hash (hex); every swap when absent
        order: Option<String>,
    },
}

const CANCEL_POLL: Duration = Duration::from_secs(60);

fn parse_fill(s: &str) -> Result<(u128, u128), String> {
    let (src, dst) = s
        .split_once(':')
        .ok_or_else(|| format!("expected SRC:DST, got {s}"))?;
    let src = src.trim().parse().map_err(|e| format!("bad SRC: {e}"))?;
    let dst = dst.trim().parse().map_err(|e| format!("bad DST: {e}"))?;
    Ok((src, dst))
}

fn parse_order(s: &str) -> Result<Hash> {
    let bytes = hex::decode(s.trim_start_matches("0x")).context("order hash is not hex")?;
    let hash: Hash = bytes
        .try_into()
        .map_err(|b: Vec<u8>| anyhow::anyhow!("order hash must be 32 bytes, got {}", b.len()))?;
    Ok(hash)
}

/// Both simulated chains plus the orchestrator driving them.
struct Simulation {
    src: Arc<SimulatedChain>,
    dst: Arc<SimulatedChain>,
    orchestrator: SwapOrchestrator,
}

impl Simulation {
    fn new(store: Arc<JsonFileSwapStore>, config: SwapConfig) -> Self {
        let now = SystemTimeSource.now();
        let clock = Arc::new(TokioClock::starting_at(now));

        let src = SimulatedChain::new(EscrowLedger::new(
            ChainId::Sepolia,
            config.ledger_config(),
            clock.clone(),
        ));
        let dst = SimulatedChain::new(EscrowLedger::new(
            ChainId::XrplTestnet,
            config.ledger_config(),
            clock,
        ));
        let orchestrator = SwapOrchestrator::new(
            Arc::new(src.adapter(resolver_src())),
            Arc::new(dst.adapter(resolver_dst())),
            store,
            config,
        );
        Self {
            src,
            dst,
            orchestrator,
        }
    }

    fn report(&self, record: &SwapRecord) {
        let native = Token::Native;
        info!(
            order = %record.order_hex(),
            status = %record.status,
            maker_src = self.src.ledger().balance_of(&maker_src(), &native),
            resolver_src = self.src.ledger().balance_of(&resolver_src(), &native),
            maker_dst = self.dst.ledger().balance_of(&maker_dst(), &native),
            resolver_dst = self.dst.ledger().balance_of(&resolver_dst(), &native),
            "[xswap] Balances"
        );
    }
}

fn maker_src() -> Address {
    Address::new("0x1111111111111111111111111111111111111111")
}

fn resolver_src() -> Address {
    Address::new("0x2222222222222222222222222222222222222222")
}

fn maker_dst() -> Address {
    Address::new("rMakerXXXXXXXXXXXXXXXXXXXXXXXXXXX")
}

fn resolver_dst() -> Address {
    Address::new("rResolverXXXXXXXXXXXXXXXXXXXXXXXX")
}

fn request(src_amount: u128, dst_amount: u128, src_deposit: u128, dst_deposit: u128) -> SwapRequest {
    SwapRequest {
        order_hash: None,
        maker_src: maker_src(),
        maker_dst: maker_dst(),
        taker_src: resolver_src(),
        taker_dst: resolver_dst(),
        src_token: Token::Native,
        dst_token: Token::Native,
        src_amount,
        dst_amount,
        src_safety_deposit: src_deposit,
        dst_safety_deposit: dst_deposit,
        schedule: None,
    }
}

fn print_record(record: &SwapRecord) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&record.public_view())?);
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let store = Arc::new(
        JsonFileSwapStore::open(&args.store)
            .with_context(|| format!("failed to open store {}", args.store.display()))?,
    );
    let config = SwapConfig::from_env();

    match args.command {
        Command::Status { order: Some(order) } => {
            let hash = parse_order(&order)?;
            match store.get(&hash)? {
                Some(record) => print_record(&record),
                None => bail!("no swap with order hash {order}"),
            }
        }
        Command::Status { order: None } => {
            for record in store.list()? {
                println!(
                    "{}  {:<18} src={} dst={}",
                    record.order_hex(),
                    record.status.to_string(),
                    record.src.amount,
                    record.dst.amount
                );
            }
            Ok(())
        }
        Command::Run {
            src_amount,
            dst_amount,
            src_deposit,
            dst_deposit,
        } => {
            let sim = Simulation::new(store, config);
            let record = sim
                .orchestrator
                .create_swap(request(src_amount, dst_amount, src_deposit, dst_deposit))
                .instrument(swap_span!("swap", mode = "single"))
                .await?;
            sim.report(&record);
            print_record(&record)
        }
        Command::RunPartial {
            total_src,
            total_dst,
            fills,
        } => {
            let sim = Simulation::new(store, config);
            let parent = htlc_swap::keccak256(&[
                &total_src.to_be_bytes()[..],
                &total_dst.to_be_bytes()[..],
                &SystemTimeSource.now().to_be_bytes()[..],
            ]);
            sim.orchestrator.open_order(parent, total_src, total_dst)?;
            info!(parent = %hex::encode(parent), total_src, total_dst, "[xswap] Order opened");

            for (amount_src, amount_dst) in fills {
                let template = request(amount_src, amount_dst, 10, 5);
                let outcome = sim
                    .orchestrator
                    .fill_order(parent, amount_src, amount_dst, template)
                    .instrument(swap_span!("fill", amount_src, amount_dst))
                    .await;
                match outcome {
                    Ok(record) => {
                        sim.report(&record);
                        print_record(&record)?;
                    }
                    Err(e) => tracing::warn!(amount_src, amount_dst, error = %e, "[xswap] Fill rejected"),
                }
            }

            let state = sim.orchestrator.order_state(&parent)?;
            println!("{}", serde_json::to_string_pretty(&state)?);
            Ok(())
        }
        Command::ForceCancel {
            src_amount,
            dst_amount,
        } => {
            let sim = Simulation::new(store, config);
            let order = htlc_swap::keccak256(&[
                &b"force-cancel"[..],
                &SystemTimeSource.now().to_be_bytes()[..],
            ]);
            let request = SwapRequest {
                order_hash: Some(order),
                ..request(src_amount, dst_amount, 10, 5)
            };

            // Source RPC unreachable: the swap stops after the destination leg.
            sim.src.fail_next_submissions(u32::MAX);
            if let Ok(record) = sim
                .orchestrator
                .create_swap(request)
                .instrument(swap_span!("swap", mode = "force-cancel"))
                .await
            {
                sim.report(&record);
                return print_record(&record);
            }
            sim.src.fail_next_submissions(0);

            let record = loop {
                match sim.orchestrator.cancel_swap(&order).await {
                    Ok(record) => break record,
                    Err(SwapError::RetryLater { stage, reason }) => {
                        info!(order = %hex::encode(order), stage, reason = %reason, "[xswap] Refund window not open yet");
                        tokio::time::sleep(CANCEL_POLL).await;
                    }
                    Err(e) => return Err(e.into()),
                }
            };
            sim.report(&record);
            print_record(&record)
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _telemetry = init_telemetry(TelemetryConfig::for_component("runtime"))?;

    let mut builder = tokio::runtime::Builder::new_current_thread();
    builder.enable_all();
    if !args.real_time {
        builder.start_paused(true);
    }
    let runtime = builder.build().context("failed to build tokio runtime")?;
    runtime.block_on(run(args))
}
