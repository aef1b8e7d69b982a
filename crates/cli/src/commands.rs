use std::net::IpAddr;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stubres_domain::config::{DEFAULT_NAMESERVER, DNS_PORT};
use stubres_domain::{Config, DnsReply, QueryToken, RecordType};
use stubres_infrastructure::dns::{
    NameServerStats, QueryCallback, ResolverDriver, StubResolver, StubResolverBuilder,
    UdpResolverSocket,
};
use tracing::{error, info};

pub enum Outcome {
    AllResolved,
    SomeFailed,
}

impl Outcome {
    fn from_failed(failed: bool) -> Self {
        if failed {
            Outcome::SomeFailed
        } else {
            Outcome::AllResolved
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Outcome::AllResolved => ExitCode::SUCCESS,
            Outcome::SomeFailed => ExitCode::FAILURE,
        }
    }
}

/// Callback outcomes tagged with the position of the request on the
/// command line; the token of each request is that same position.
#[derive(Clone, Default)]
struct Collected(Arc<Mutex<Vec<(usize, Option<DnsReply>)>>>);

impl Collected {
    fn callback(&self, index: usize) -> QueryCallback {
        let results = self.0.clone();
        Box::new(move |reply| {
            results
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push((index, reply));
        })
    }

    fn take_sorted(&self) -> Vec<(usize, Option<DnsReply>)> {
        let mut results = std::mem::take(&mut *self.0.lock().unwrap_or_else(|e| e.into_inner()));
        results.sort_by_key(|(index, _)| *index);
        results
    }
}

fn start_driver(config: &Config) -> anyhow::Result<ResolverDriver> {
    let conf = config.resolver.load_nameservers();
    let first = conf.nameservers.first().copied().unwrap_or(DEFAULT_NAMESERVER);
    let socket = UdpResolverSocket::open_for(first)?;
    let resolver = StubResolverBuilder::new(conf).build(socket);

    Ok(ResolverDriver::new(
        resolver,
        Duration::from_millis(config.resolver.tick_interval_ms),
    ))
}

pub async fn lookup(
    config: &Config,
    names: &[String],
    aaaa: bool,
    stats: bool,
) -> anyhow::Result<Outcome> {
    let record_type = if aaaa { RecordType::AAAA } else { RecordType::A };
    let mut driver = start_driver(config)?;
    let collected = Collected::default();
    let mut failed = false;

    for (index, name) in names.iter().enumerate() {
        let submitted = driver.resolver_mut().submit_forward(
            name,
            record_type,
            QueryToken(index as u64),
            collected.callback(index),
        );
        if let Err(e) = submitted {
            error!(name = %name, error = %e, "Lookup not started");
            println!("{}: {}", name, e);
            failed = true;
        }
    }

    info!(
        queries = driver.resolver().live_count(),
        record_type = %record_type,
        "Waiting for replies"
    );
    driver.run_to_completion().await?;

    for (index, reply) in collected.take_sorted() {
        match reply {
            Some(reply) => println!("{}", reply),
            None => {
                println!("{}: no {} record", names[index], record_type);
                failed = true;
            }
        }
    }

    if stats {
        print_stats(driver.resolver());
    }
    Ok(Outcome::from_failed(failed))
}

pub async fn reverse(
    config: &Config,
    addresses: &[IpAddr],
    stats: bool,
) -> anyhow::Result<Outcome> {
    let mut driver = start_driver(config)?;
    let collected = Collected::default();
    let mut failed = false;

    for (index, address) in addresses.iter().enumerate() {
        let submitted = driver.resolver_mut().submit_reverse(
            *address,
            QueryToken(index as u64),
            collected.callback(index),
        );
        if let Err(e) = submitted {
            error!(address = %address, error = %e, "Lookup not started");
            println!("{}: {}", address, e);
            failed = true;
        }
    }

    driver.run_to_completion().await?;

    for (index, reply) in collected.take_sorted() {
        let address = addresses[index];
        match reply {
            Some(reply) if reply.address == address => {
                println!("{} -> {}", address, reply.hostname);
            }
            Some(reply) => {
                println!(
                    "{} -> {} (forward lookup returned {})",
                    address, reply.hostname, reply.address
                );
                failed = true;
            }
            None => {
                println!("{}: no confirmed name", address);
                failed = true;
            }
        }
    }

    if stats {
        print_stats(driver.resolver());
    }
    Ok(Outcome::from_failed(failed))
}

/// Prints the nameservers and default domain the resolver ended up with,
/// in resolv.conf syntax, each server annotated with its timeout counter.
pub fn servers(config: &Config) -> anyhow::Result<()> {
    let driver = start_driver(config)?;
    let resolver = driver.resolver();
    for line in server_report(resolver.domain(), &resolver.nameserver_stats()) {
        println!("{}", line);
    }
    Ok(())
}

fn server_report(domain: Option<&str>, stats: &[NameServerStats]) -> Vec<String> {
    let mut lines = Vec::with_capacity(stats.len() + 1);
    if let Some(domain) = domain {
        lines.push(format!("domain {}", domain));
    }
    lines.extend(stats.iter().map(|server| {
        let address = if server.address.port() == DNS_PORT {
            server.address.ip().to_string()
        } else {
            server.address.to_string()
        };
        format!(
            "nameserver {}  # {} consecutive timeouts",
            address, server.consecutive_timeouts
        )
    }));
    lines
}

fn print_stats(resolver: &StubResolver<UdpResolverSocket>) {
    for server in resolver.nameserver_stats() {
        eprintln!(
            "{}: {} consecutive timeouts",
            server.address, server.consecutive_timeouts
        );
    }
}
