//! MCommunity CLI
//!
//! Command-line examples for the MCommunity directory API. Each subcommand
//! issues one API call and prints the status code and raw body.
//!
//! # Usage
//!
//! ```bash
//! # Public person lookups
//! mcommunity people get --uniqname bjensen
//! mcommunity people find -u bjensen
//! mcommunity people search --part ou:contain:Student --part givenName:start:John --limit 3
//!
//! # Authenticated group operations (needs app_id / app_password)
//! mcommunity group get -g api-examples-group
//! mcommunity group create --owner frnkwang --email this-is-fake --description "My description"
//! mcommunity group attribute owner --add ethierba --delete frnkwang
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use mcommunity_core::{
    ApiResponse, AttributeChange, AuthHeaderProvider, Authorizer, ClientConfig, DirectoryClient,
    GroupCn, GroupPatch, LogicalOperator, NewGroup, PersonDn, SearchPart, SearchRequest,
    SearchType, Uniqname,
};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "mcommunity")]
#[command(about = "Examples for the MCommunity directory API")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to <config dir>/mcommunity/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Obtain an access token for the configured application ID
    Token,

    /// Person lookups
    #[command(subcommand)]
    People(PeopleCommand),

    /// Group lookups and lifecycle operations
    Group(GroupArgs),
}

#[derive(Args)]
struct UniqnameArg {
    /// Person's uniqname (defaults to the configured uniqname)
    #[arg(short, long)]
    uniqname: Option<String>,
}

#[derive(Subcommand)]
enum PeopleCommand {
    /// List a few people
    List,

    /// Get the details of one person
    Get(UniqnameArg),

    /// Find a person by exact uniqname
    Find(UniqnameArg),

    /// Search the directory
    Search {
        /// Criterion as attribute:type:value (type is start, end, contain or exact)
        #[arg(short, long = "part", required = true, value_parser = parse_search_part)]
        parts: Vec<SearchPart>,

        /// Combine criteria with OR instead of AND
        #[arg(long)]
        any: bool,

        /// Maximum number of entries
        #[arg(short, long)]
        limit: Option<u32>,

        /// Attributes to return
        #[arg(short, long = "attribute")]
        attributes: Vec<String>,
    },

    /// Get a person's vCard (authenticated)
    Vcard(UniqnameArg),

    /// Get a person's name coach information
    NameCoach(UniqnameArg),
}

#[derive(Args)]
struct GroupArgs {
    /// Group name (defaults to the configured group_name)
    #[arg(short, long, global = true)]
    group: Option<String>,

    #[command(subcommand)]
    command: GroupCommand,
}

#[derive(Subcommand)]
enum GroupCommand {
    /// Get the details of the group
    Get,

    /// Create the group
    Create {
        /// Group email, without the mail domain
        #[arg(short, long)]
        email: String,

        /// Owner uniqname or DN (repeatable)
        #[arg(short, long, required = true)]
        owner: Vec<String>,

        /// Member uniqname or DN (repeatable)
        #[arg(short, long)]
        member: Vec<String>,

        /// Group description
        #[arg(short, long)]
        description: String,
    },

    /// Replace single-valued attributes
    Patch {
        /// Attribute as name=value (repeatable)
        #[arg(short, long = "set", value_parser = parse_assignment)]
        set: Vec<(String, String)>,

        /// Attribute to remove (repeatable)
        #[arg(short, long = "remove")]
        remove: Vec<String>,
    },

    /// Delete the group permanently
    Delete,

    /// Extend the group's expiration to a year from today
    Renew,

    /// Expire the group; it is deleted permanently after the given days
    Expire {
        /// Days until permanent deletion (7 to 365)
        #[arg(short, long, default_value_t = 7)]
        days: u32,
    },

    /// Add or remove values of a multi-valued attribute
    Attribute {
        /// Attribute name (e.g., member, owner)
        attribute: String,

        /// Value to add (repeatable); bare uniqnames become DNs
        #[arg(short, long)]
        add: Vec<String>,

        /// Value to delete (repeatable); bare uniqnames become DNs
        #[arg(short, long)]
        delete: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Run one command. `Ok(false)` means the API answered with a non-success status.
async fn run(cli: Cli) -> Result<bool> {
    let config = ClientConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    debug!("using API at {}", config.api_uri);

    match cli.command {
        Commands::Token => token(&config).await,
        Commands::People(command) => {
            let client = DirectoryClient::new(&config)?;
            let response = people(&client, &config, command).await?;
            Ok(print_response(&response))
        }
        Commands::Group(args) => {
            let client = DirectoryClient::new(&config)?;
            let cn = group_name(args.group, &config)?;
            let response = group(&client, &cn, args.command).await?;
            Ok(print_response(&response))
        }
    }
}

async fn token(config: &ClientConfig) -> Result<bool> {
    let http = mcommunity_core::http::build_client(config)?;
    let auth = Authorizer::from_config(config, http)?;
    let header = auth
        .get_auth_header()
        .await
        .context("failed to obtain access token")?;

    let pair = auth.token_pair().await;
    println!("{}: Bearer [REDACTED] ({} chars)", header.key(), header.value().len() - "Bearer ".len());
    println!("state={}", auth.state().await);
    println!(
        "refresh_token={}",
        if pair.is_some_and(|p| p.refresh_token.is_some()) { "present" } else { "absent" }
    );
    Ok(true)
}

async fn people(client: &DirectoryClient, config: &ClientConfig, command: PeopleCommand) -> Result<ApiResponse> {
    let people = client.people();

    let response = match command {
        PeopleCommand::List => people.list().await?,
        PeopleCommand::Get(arg) => people.get(&uniqname(arg, config)?).await?,
        PeopleCommand::Find(arg) => {
            let request = SearchRequest::exact_uid(&uniqname(arg, config)?);
            people.find(&request).await?
        }
        PeopleCommand::Search { parts, any, limit, attributes } => {
            let mut request = SearchRequest::new(parts)
                .with_operator(if any { LogicalOperator::Or } else { LogicalOperator::And })
                .with_attributes(attributes);
            if let Some(limit) = limit {
                request = request.with_num_entries(limit);
            }
            people.search(&request).await?
        }
        PeopleCommand::Vcard(arg) => people.vcard(&uniqname(arg, config)?).await?,
        PeopleCommand::NameCoach(arg) => people.name_coach(&uniqname(arg, config)?).await?,
    };

    Ok(response)
}

async fn group(client: &DirectoryClient, cn: &GroupCn, command: GroupCommand) -> Result<ApiResponse> {
    let groups = client.groups();

    let response = match command {
        GroupCommand::Get => groups.get(cn).await?,
        GroupCommand::Create { email, owner, member, description } => {
            let group = NewGroup::new(cn.clone(), email, dns(&owner), description)
                .with_members(dns(&member));
            groups.create(&group).await?
        }
        GroupCommand::Patch { set, remove } => {
            let patch = build_patch(set, remove)?;
            groups.patch(cn, &patch).await?
        }
        GroupCommand::Delete => groups.delete(cn).await?,
        GroupCommand::Renew => groups.renew(cn).await?,
        GroupCommand::Expire { days } => groups.expire(cn, days).await?,
        GroupCommand::Attribute { attribute, add, delete } => {
            let change = AttributeChange {
                add: dns(&add).into_iter().map(|dn| dn.to_string()).collect(),
                delete: dns(&delete).into_iter().map(|dn| dn.to_string()).collect(),
            };
            groups.modify_attribute(cn, &attribute, &change).await?
        }
    };

    Ok(response)
}

/// Print the request line and the response as the API returned it.
fn print_response(response: &ApiResponse) -> bool {
    println!("{}", request_line(response));
    println!("status_code={} body={}", response.status.as_u16(), response.body);
    response.is_success()
}

fn request_line(response: &ApiResponse) -> String {
    match &response.request_body {
        Some(body) => format!("method={} url={} body={}", response.method, response.url, body),
        None => format!("method={} url={}", response.method, response.url),
    }
}

fn uniqname(arg: UniqnameArg, config: &ClientConfig) -> Result<Uniqname> {
    match arg.uniqname.or_else(|| config.uniqname.clone()) {
        Some(uid) if !uid.trim().is_empty() => Ok(Uniqname::new(uid)),
        _ => bail!("no uniqname given (use --uniqname or set uniqname in the configuration)"),
    }
}

fn group_name(arg: Option<String>, config: &ClientConfig) -> Result<GroupCn> {
    match arg.or_else(|| config.group_name.clone()) {
        Some(cn) if !cn.is_empty() => Ok(GroupCn::new(cn)),
        _ => bail!("no group given (use --group or set group_name in the configuration)"),
    }
}

fn dns(values: &[String]) -> Vec<PersonDn> {
    values.iter().map(|v| PersonDn::parse(v)).collect()
}

fn build_patch(set: Vec<(String, String)>, remove: Vec<String>) -> Result<GroupPatch> {
    if set.is_empty() && remove.is_empty() {
        bail!("nothing to patch (use --set name=value or --remove name)");
    }

    let mut patch = GroupPatch::new();
    for (name, value) in set {
        // Booleans such as joinable are sent as JSON booleans.
        let value = match value.as_str() {
            "true" => serde_json::Value::Bool(true),
            "false" => serde_json::Value::Bool(false),
            _ => serde_json::Value::String(value),
        };
        patch = patch.set(name, value);
    }
    for name in remove {
        patch = patch.remove(name);
    }
    Ok(patch)
}

fn parse_search_part(s: &str) -> std::result::Result<SearchPart, String> {
    let mut fields = s.splitn(3, ':');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(attribute), Some(kind), Some(value)) if !attribute.is_empty() => {
            let search_type: SearchType = kind.parse()?;
            Ok(SearchPart::new(attribute, search_type, value))
        }
        _ => Err(format!("expected attribute:type:value, got {}", s)),
    }
}

fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got {}", s)),
    }
}
