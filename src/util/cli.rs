use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{event, Level};

use crate::core::models::{Client, Token};
use crate::db::{ClientStoreOptions, DbClientStore, DbPool, DbTokenStore, PoolOptions, TokenStoreOptions};
use crate::error::Result;
use crate::store::{ClientStore, TokenStore};

#[derive(Parser)]
#[clap(
    name = "oauth2-store-util",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS")
)]
pub struct Options {
    #[clap(env = "DATABASE_URL")]
    database_url: String,
    #[clap(long, env = "CLIENT_TABLE", default_value = "oauth2_clients")]
    client_table: String,
    #[clap(long, env = "TOKEN_TABLE", default_value = "oauth2_tokens")]
    token_table: String,
    #[clap(long, env = "MAX_OPEN_CONNS", default_value = "50")]
    max_open_conns: u32,
    #[clap(long, env = "MAX_IDLE_CONNS", default_value = "25")]
    max_idle_conns: u32,
    #[clap(long, env = "CONN_MAX_LIFETIME_SECS", default_value = "7200")]
    conn_max_lifetime_secs: u64,
    #[clap(subcommand)]
    command: SubCommand,
}

#[derive(Subcommand)]
enum SubCommand {
    InitSchema(InitSchema),
    CreateClient(CreateClient),
    GetClient(GetClient),
    GetToken(TokenKey),
    RemoveToken(TokenKey),
    Sweep(Sweep),
}

/// Create both tables if they are missing
#[derive(Parser)]
struct InitSchema;

#[derive(Parser)]
struct CreateClient {
    #[clap(short, long)]
    id: String,
    #[clap(short, long)]
    secret: String,
    #[clap(short, long)]
    domain: String,
    #[clap(short, long)]
    user_id: Option<String>,
}

#[derive(Parser)]
struct GetClient {
    #[clap(short, long)]
    id: String,
}

#[derive(Parser)]
struct TokenKey {
    #[clap(long, conflicts_with_all = &["access", "refresh"])]
    code: Option<String>,
    #[clap(long, conflicts_with = "refresh")]
    access: Option<String>,
    #[clap(long)]
    refresh: Option<String>,
}

/// Delete expired and orphaned token rows once
#[derive(Parser)]
struct Sweep;

impl Options {
    fn pool(&self) -> Result<DbPool> {
        PoolOptions::default()
            .max_open_conns(self.max_open_conns)
            .max_idle_conns(self.max_idle_conns)
            .max_lifetime(Some(Duration::from_secs(self.conn_max_lifetime_secs)))
            .build(&self.database_url)
    }

    fn client_store(&self, pool: DbPool) -> Result<DbClientStore> {
        let options = ClientStoreOptions::default()
            .table_name(&self.client_table)
            .init_table_disabled();
        DbClientStore::new(pool, options)
    }

    fn token_store(&self, pool: DbPool) -> Result<DbTokenStore> {
        let options = TokenStoreOptions::default()
            .table_name(&self.token_table)
            .init_table_disabled()
            .gc_disabled();
        DbTokenStore::new(pool, options)
    }
}

fn print_json<T: serde::Serialize>(value: &Option<T>) -> Result<()> {
    match value {
        Some(value) => {
            let json = serde_json::to_string_pretty(value).map_err(crate::error::Error::Serialize)?;
            println!("{}", json);
        }
        None => println!("not found"),
    }
    Ok(())
}

fn init_schema(_c: &InitSchema, opts: &Options) -> Result<()> {
    let pool = opts.pool()?;
    opts.client_store(pool.clone())?.init_table()?;
    opts.token_store(pool)?.init_table()?;
    event!(Level::INFO, client_table = %opts.client_table, token_table = %opts.token_table, "Schema ready");
    Ok(())
}

fn create_client(c: &CreateClient, opts: &Options) -> Result<()> {
    let store = opts.client_store(opts.pool()?)?;

    let mut client = Client::new(&c.id, &c.secret, &c.domain);
    if let Some(user_id) = &c.user_id {
        client = client.with_user_id(user_id);
    }

    store.create(&client)
}

fn get_client(c: &GetClient, opts: &Options) -> Result<()> {
    let store = opts.client_store(opts.pool()?)?;
    print_json(&store.get_by_id(&c.id)?)
}

fn get_token(key: &TokenKey, opts: &Options) -> Result<()> {
    let store = opts.token_store(opts.pool()?)?;

    let token: Option<Token> = match key {
        TokenKey { code: Some(code), .. } => store.get_by_code(code)?,
        TokenKey { access: Some(access), .. } => store.get_by_access(access)?,
        TokenKey { refresh: Some(refresh), .. } => store.get_by_refresh(refresh)?,
        _ => None,
    };

    print_json(&token)
}

fn remove_token(key: &TokenKey, opts: &Options) -> Result<()> {
    let store = opts.token_store(opts.pool()?)?;

    match key {
        TokenKey { code: Some(code), .. } => store.remove_by_code(code),
        TokenKey { access: Some(access), .. } => store.remove_by_access(access),
        TokenKey { refresh: Some(refresh), .. } => store.remove_by_refresh(refresh),
        _ => Ok(()),
    }
}

fn sweep(_c: &Sweep, opts: &Options) -> Result<()> {
    let store = opts.token_store(opts.pool()?)?;
    let removed = store.clean_up()?;
    println!("removed {} token rows", removed);
    Ok(())
}

pub fn run_cli_action(opts: Options) -> Result<()> {
    match &opts.command {
        SubCommand::InitSchema(c) => init_schema(c, &opts),
        SubCommand::CreateClient(c) => create_client(c, &opts),
        SubCommand::GetClient(c) => get_client(c, &opts),
        SubCommand::GetToken(c) => get_token(c, &opts),
        SubCommand::RemoveToken(c) => remove_token(c, &opts),
        SubCommand::Sweep(c) => sweep(c, &opts),
    }
}
