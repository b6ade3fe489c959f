//! Owner-side tooling for LastSecret delegated access

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgMatches, Command};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

use lastsecret_core::{
    AccessGrant, Address, CoreError, DomainScheme, GrantClaim, GrantIssuer, LedgerDomain, Salt,
};

mod keystore;

use keystore::KeyFile;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let matches = Command::new("lastsecret")
        .version("0.1.0")
        .about("Issue and check signed access grants for a LastSecret ledger")
        .subcommand_required(true)
        .subcommand(
            Command::new("keygen")
                .about("Generate a signing key and write it to a key file")
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_name("PATH")
                        .help("Key file destination")
                        .default_value("owner-key.json"),
                ),
        )
        .subcommand(
            Command::new("grant")
                .about("Issue a signed access grant for a delegate")
                .arg(
                    Arg::new("keyfile")
                        .long("keyfile")
                        .value_name("PATH")
                        .help("Key file holding the owner's signing key")
                        .default_value("owner-key.json"),
                )
                .arg(
                    Arg::new("delegate")
                        .long("delegate")
                        .value_name("ADDR")
                        .help("Identity the grant names")
                        .required(true),
                )
                .arg(
                    Arg::new("ledger")
                        .long("ledger")
                        .value_name("ADDR")
                        .help("Address of the target ledger deployment")
                        .required(true),
                )
                .arg(
                    Arg::new("chain-id")
                        .long("chain-id")
                        .value_name("N")
                        .help("Chain the ledger lives on")
                        .default_value("1"),
                )
                .arg(
                    Arg::new("scheme")
                        .long("scheme")
                        .value_name("NAME")
                        .help("Domain scheme the ledger pins (salted-v1 or tagged-v2)")
                        .default_value("salted-v1"),
                )
                .arg(
                    Arg::new("ttl")
                        .long("ttl")
                        .value_name("SECS")
                        .help("Validity window from now")
                        .default_value("3600")
                        .conflicts_with("expires-at"),
                )
                .arg(
                    Arg::new("expires-at")
                        .long("expires-at")
                        .value_name("UNIX")
                        .help("Absolute expiry in unix seconds"),
                )
                .arg(
                    Arg::new("salt")
                        .long("salt")
                        .value_name("HEX")
                        .help("Explicit 32-byte salt instead of a random one"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_name("PATH")
                        .help("Write the grant here instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("verify")
                .about("Check a grant file against an expected owner and caller")
                .arg(
                    Arg::new("grant")
                        .long("grant")
                        .value_name("PATH")
                        .help("Grant file to check")
                        .required(true),
                )
                .arg(
                    Arg::new("caller")
                        .long("caller")
                        .value_name("ADDR")
                        .help("Identity that would present the grant")
                        .required(true),
                )
                .arg(
                    Arg::new("owner")
                        .long("owner")
                        .value_name("ADDR")
                        .help("Address the signature must recover to")
                        .required(true),
                )
                .arg(
                    Arg::new("ledger")
                        .long("ledger")
                        .value_name("ADDR")
                        .help("Address of the target ledger deployment")
                        .required(true),
                )
                .arg(
                    Arg::new("chain-id")
                        .long("chain-id")
                        .value_name("N")
                        .help("Chain the ledger lives on")
                        .default_value("1"),
                )
                .arg(
                    Arg::new("scheme")
                        .long("scheme")
                        .value_name("NAME")
                        .help("Domain scheme the ledger pins (salted-v1 or tagged-v2)")
                        .default_value("salted-v1"),
                )
                .arg(
                    Arg::new("at")
                        .long("at")
                        .value_name("UNIX")
                        .help("Check expiry as of this time instead of now"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("keygen", sub)) => run_keygen(sub),
        Some(("grant", sub)) => run_grant(sub),
        Some(("verify", sub)) => run_verify(sub),
        _ => unreachable!("subcommand is required"),
    }
}

fn run_keygen(sub: &ArgMatches) -> Result<()> {
    let path = PathBuf::from(sub.get_one::<String>("out").unwrap());
    if path.exists() {
        bail!("refusing to overwrite existing key file {}", path.display());
    }

    let file = KeyFile::generate();
    file.save(&path)?;

    info!(path = %path.display(), "wrote new key file");
    println!("{}", file.address);
    Ok(())
}

fn run_grant(sub: &ArgMatches) -> Result<()> {
    let keyfile_path = PathBuf::from(sub.get_one::<String>("keyfile").unwrap());
    let keys = KeyFile::load(&keyfile_path)?.keypair()?;

    let domain = domain_from_args(sub)?;
    let delegate = parse_address(sub, "delegate")?;
    let expires_at = resolve_expiry(sub)?;

    let issuer = GrantIssuer::new(keys, domain);
    let grant = match sub.get_one::<String>("salt") {
        None => issuer.issue(delegate, expires_at)?,
        Some(raw) => {
            if !domain.scheme.salted() {
                bail!("--salt only applies to the salted-v1 scheme");
            }
            let salt: Salt = raw.parse().context("invalid --salt")?;
            issuer.issue_claim(delegate, GrantClaim::Salted { expires_at, salt })?
        }
    };

    info!(
        delegate = %delegate,
        expires_at,
        expires = %format_time(expires_at),
        "issued grant"
    );

    let json = serde_json::to_string_pretty(&grant)?;
    match sub.get_one::<String>("out") {
        Some(path) => {
            fs::write(path, json + "\n").with_context(|| format!("writing grant to {}", path))?;
            info!(path = %path, "wrote grant file");
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn run_verify(sub: &ArgMatches) -> Result<()> {
    let grant_path = sub.get_one::<String>("grant").unwrap();
    let raw = fs::read_to_string(grant_path)
        .with_context(|| format!("reading grant file {}", grant_path))?;
    let grant: AccessGrant = serde_json::from_str(&raw)
        .with_context(|| format!("parsing grant file {}", grant_path))?;

    let caller = parse_address(sub, "caller")?;
    let owner = parse_address(sub, "owner")?;
    let domain = domain_from_args(sub)?;
    let now = match sub.get_one::<String>("at") {
        Some(raw) => raw.parse::<u64>().context("invalid --at")?,
        None => unix_now(),
    };

    println!("scheme:     {}", grant.scheme());
    println!(
        "expires at: {} ({})",
        grant.expires_at(),
        format_time(grant.expires_at())
    );

    match grant.recover_signer(caller, &domain) {
        Ok(signer) => {
            println!("signer:     {}", signer);
            if signer != owner {
                bail!("recovered signer does not match the expected owner {}", owner);
            }
        }
        Err(err @ CoreError::SchemeMismatch { .. }) => bail!("grant rejected: {}", err),
        Err(err) => bail!("signature invalid: {}", err),
    }

    if now > grant.expires_at() {
        bail!("grant expired {} seconds ago", now - grant.expires_at());
    }

    println!(
        "grant is valid for caller {} until {}",
        caller,
        format_time(grant.expires_at())
    );
    println!("note: enablement is ledger state and cannot be checked off-ledger");
    Ok(())
}

fn parse_address(sub: &ArgMatches, name: &str) -> Result<Address> {
    let raw = sub.get_one::<String>(name).unwrap();
    raw.parse()
        .with_context(|| format!("invalid --{}: {}", name, raw))
}

fn domain_from_args(sub: &ArgMatches) -> Result<LedgerDomain> {
    let chain_id = sub
        .get_one::<String>("chain-id")
        .unwrap()
        .parse::<u64>()
        .context("invalid --chain-id")?;
    let ledger = parse_address(sub, "ledger")?;
    let scheme = sub
        .get_one::<String>("scheme")
        .unwrap()
        .parse::<DomainScheme>()
        .context("invalid --scheme")?;

    Ok(LedgerDomain::new(chain_id, ledger, scheme))
}

fn resolve_expiry(sub: &ArgMatches) -> Result<u64> {
    if let Some(raw) = sub.get_one::<String>("expires-at") {
        return raw.parse::<u64>().context("invalid --expires-at");
    }

    let ttl = sub
        .get_one::<String>("ttl")
        .unwrap()
        .parse::<u64>()
        .context("invalid --ttl")?;
    Ok(unix_now().saturating_add(ttl))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn format_time(unix: u64) -> String {
    chrono::DateTime::from_timestamp(unix as i64, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "out of range".to_string())
}
