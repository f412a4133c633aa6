//! Celereum Objects - address derivation and object lifecycle tool
//!
//! Usage:
//!   celereum-objects --help

use std::error::Error;
use std::path::PathBuf;

use celereum_objects::{
    core::{Address, RuntimeConfig},
    objects::{
        create_object_address, create_object_address_from_guid, create_resource_address,
        Capability, EventLog, GuidId, MemoryExecutor, ObjectError, Signer, TransferRef,
    },
};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Deepest nesting limit the demo will build a chain for
const DEMO_NESTING_CAP: u32 = 64;

#[derive(Parser)]
#[command(name = "celereum-objects")]
#[command(author = "Celereum Team")]
#[command(version)]
#[command(about = "Celereum object model tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive a named object address
    Derive {
        /// Creator address (0x-hex or base58)
        #[arg(short, long)]
        creator: Address,

        /// Seed bytes, taken as UTF-8
        #[arg(short, long)]
        seed: String,
    },

    /// Derive the address of an object created from a GUID
    GuidAddress {
        /// Account or object that issued the GUID
        #[arg(short, long)]
        creator: Address,

        /// GUID creation number
        #[arg(short = 'n', long)]
        creation_num: u64,
    },

    /// Derive a resource account address
    ResourceAddress {
        /// Source account address
        #[arg(short, long)]
        creator: Address,

        /// Seed bytes, taken as UTF-8
        #[arg(short, long)]
        seed: String,
    },

    /// Run a scripted object lifecycle against in-memory state
    Demo {
        /// JSON runtime config
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the ownership nesting limit
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(DEMO_NESTING_CAP)))]
        max_nesting: Option<u32>,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Derive { creator, seed } => {
            print_address(create_object_address(&creator, seed.as_bytes()));
            Ok(())
        }
        Commands::GuidAddress {
            creator,
            creation_num,
        } => {
            let id = GuidId::new(creator, creation_num);
            print_address(create_object_address_from_guid(&id));
            Ok(())
        }
        Commands::ResourceAddress { creator, seed } => {
            print_address(create_resource_address(&creator, seed.as_bytes()));
            Ok(())
        }
        Commands::Demo {
            config,
            max_nesting,
        } => run_demo(config, max_nesting),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn print_address(address: Address) {
    println!("hex:    {}", address.to_hex_literal());
    println!("base58: {}", address.to_base58());
}

fn load_config(
    path: Option<PathBuf>,
    max_nesting: Option<u32>,
) -> Result<RuntimeConfig, Box<dyn Error>> {
    let mut config = match path {
        Some(path) => RuntimeConfig::from_json_file(path)?,
        None => RuntimeConfig::default(),
    };
    if let Some(depth) = max_nesting {
        config = config.with_max_nesting_depth(depth);
    }
    Ok(config)
}

fn run_demo(config: Option<PathBuf>, max_nesting: Option<u32>) -> Result<(), Box<dyn Error>> {
    let config = load_config(config, max_nesting)?;
    let limit = config.max_nesting_depth;
    let executor = MemoryExecutor::in_memory(config)?;
    info!("Nesting limit: {}", limit);

    let alice = Signer::privileged(Address::from_u64(0xa11ce));
    let bob = Signer::privileged(Address::from_u64(0xb0b));

    // Alice creates a vault and a gem, and puts the gem in the vault.
    let (vault, gem, gem_transfer) = executor.execute(|session| {
        let vault = session.create_named_object(&alice, b"vault")?;
        let gem = session.create_object_from_account(&alice)?;
        session.transfer_to_object(&alice, gem.object_address(), vault.object_address())?;
        Ok((
            vault.object_address(),
            gem.object_address(),
            gem.generate_transfer_ref(),
        ))
    })?;
    info!("Vault: {}", vault);
    info!("Gem:   {}", gem);

    // Handing the vault to bob hands him the gem too.
    executor.execute(|session| session.transfer(&alice, vault, bob.address()))?;
    let bob_owns = executor.view(|session| session.owns(gem, bob.address()))?;
    info!("Bob owns gem through vault: {}", bob_owns);

    executor.execute(|session| session.transfer(&bob, gem, bob.address()))?;
    info!("Bob took the gem out of the vault");

    // Once gated, only a linear transfer ref can move the gem.
    executor.execute(|session| session.disallow_ungated_transfer(&gem_transfer))?;
    match executor.execute(|session| session.transfer(&bob, gem, alice.address())) {
        Err(e @ ObjectError::NoUngatedTransfers(_)) => {
            warn!("Ungated transfer refused: {} (code {:#x})", e, e.abort_code())
        }
        other => other?,
    }
    move_with_ref(&executor, &gem_transfer, alice.address())?;
    let owner = executor.view(|session| session.owner(gem))?;
    info!("Gem owner after linear transfer: {}", owner);

    // Ownership store round trip.
    let stored = executor.execute(|session| {
        session.init_store(&alice)?;
        let relic = session.create_object_from_account(&alice)?;
        let id = relic.object_address();
        session.deposit(alice.address(), relic.generate_owner_ref())?;
        let delete_ref = relic.generate_delete_ref()?;
        Ok((id, delete_ref))
    })?;
    let (relic, relic_delete) = stored;
    let held = executor.view(|session| session.store_len(alice.address()))?;
    info!("Alice's store holds {} object(s)", held);

    executor.execute(|session| {
        let owner_ref = session.withdraw(&alice, relic)?;
        info!("Withdrew {}", owner_ref.object_address());
        session.delete(relic_delete)
    })?;
    let exists = executor.view(|session| Ok(session.exists_at(relic)))?;
    info!("Relic exists after delete: {}", exists);

    nest_past_limit(&executor, &alice, limit)?;

    let state = executor.state();
    info!(
        "Final state: {} address(es), digest {}",
        state.address_count(),
        state.digest().to_hex()
    );
    info!("Committed events: {}", executor.events().len());
    Ok(())
}

fn move_with_ref(
    executor: &MemoryExecutor,
    transfer_ref: &TransferRef,
    to: Address,
) -> Result<(), ObjectError> {
    executor.execute(|session| {
        let linear = session.generate_linear_transfer_ref(transfer_ref)?;
        session.transfer_with_ref(linear, to)
    })
}

/// Objects needed to nest one level past `limit`. `None` above the demo's
/// cap, which a config file can exceed.
fn nesting_chain_len(limit: u32) -> Option<u32> {
    if limit > DEMO_NESTING_CAP {
        return None;
    }
    limit.checked_add(2)
}

/// Nest objects one level deeper than `limit` and show the root owner can
/// no longer move the innermost one.
fn nest_past_limit(
    executor: &MemoryExecutor,
    owner: &Signer,
    limit: u32,
) -> Result<(), ObjectError> {
    let Some(len) = nesting_chain_len(limit) else {
        warn!(limit, cap = DEMO_NESTING_CAP, "Nesting limit too large to demo, skipping");
        return Ok(());
    };

    let innermost = executor.execute(|session| {
        let mut chain = Vec::new();
        for _ in 0..len {
            chain.push(session.create_object_from_account(owner)?.object_address());
        }
        for pair in chain.windows(2) {
            session.transfer_to_object(owner, pair[1], pair[0])?;
        }
        Ok(chain[chain.len() - 1])
    })?;

    match executor.execute(|session| session.transfer(owner, innermost, owner.address())) {
        Ok(()) => Ok(()),
        Err(e @ ObjectError::MaximumNesting { .. }) => {
            warn!("Nesting stopped: {} (code {:#x})", e, e.abort_code());
            Ok(())
        }
        Err(e) => Err(e),
    }
}
