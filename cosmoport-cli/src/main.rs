#![deny(missing_docs)]
//! Cosmoport command-line interface.
//!
//! Lists, counts, registers, updates and removes ships through a running
//! Cosmoport server.

mod client;

use chrono::{DateTime, NaiveDate, SecondsFormat};
use clap::{Args, Parser, Subcommand, ValueEnum};
use client::ShipClient;
use cosmoport_core::{PageRequest, Patch, Ship, ShipFilter, ShipInput, ShipOrder, ShipType};
use std::fmt::Write;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

#[derive(Parser)]
#[command(name = "cosmoport", version, about = "Cosmoport ship registry CLI")]
struct Cli {
    /// Base URL of the Cosmoport server.
    #[arg(long, global = true, env = "COSMOPORT_API_URL", default_value = DEFAULT_SERVER_URL)]
    server_url: String,
    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Clone, Debug, Default)]
struct FilterArgs {
    /// Name substring.
    #[arg(long)]
    name: Option<String>,
    /// Planet substring.
    #[arg(long)]
    planet: Option<String>,
    /// Ship type: TRANSPORT, MILITARY or MERCHANT.
    #[arg(long, value_parser = parse_ship_type)]
    ship_type: Option<ShipType>,
    /// Only ships built after this instant.
    #[arg(long, value_parser = parse_prod_date)]
    after: Option<i64>,
    /// Only ships built before this instant.
    #[arg(long, value_parser = parse_prod_date)]
    before: Option<i64>,
    /// Only used (`true`) or new (`false`) ships.
    #[arg(long)]
    used: Option<bool>,
    /// Minimum speed.
    #[arg(long)]
    min_speed: Option<f64>,
    /// Maximum speed.
    #[arg(long)]
    max_speed: Option<f64>,
    /// Minimum crew size.
    #[arg(long)]
    min_crew_size: Option<i32>,
    /// Maximum crew size.
    #[arg(long)]
    max_crew_size: Option<i32>,
    /// Minimum rating.
    #[arg(long)]
    min_rating: Option<f64>,
    /// Maximum rating.
    #[arg(long)]
    max_rating: Option<f64>,
}

impl From<FilterArgs> for ShipFilter {
    fn from(args: FilterArgs) -> Self {
        ShipFilter {
            name: args.name,
            planet: args.planet,
            ship_type: args.ship_type,
            after: args.after,
            before: args.before,
            is_used: args.used,
            min_speed: args.min_speed,
            max_speed: args.max_speed,
            min_crew_size: args.min_crew_size,
            max_crew_size: args.max_crew_size,
            min_rating: args.min_rating,
            max_rating: args.max_rating,
        }
    }
}

#[derive(Args, Clone, Debug)]
struct CreateArgs {
    /// Ship name (1 to 50 characters).
    #[arg(long)]
    name: String,
    /// Home planet (1 to 50 characters).
    #[arg(long)]
    planet: String,
    /// Ship type: TRANSPORT, MILITARY or MERCHANT.
    #[arg(long, value_parser = parse_ship_type)]
    ship_type: ShipType,
    /// Production date: epoch milliseconds, RFC 3339 or YYYY-MM-DD.
    #[arg(long, value_parser = parse_prod_date)]
    prod_date: i64,
    /// Speed between 0.01 and 0.99.
    #[arg(long)]
    speed: f64,
    /// Crew size between 1 and 9999.
    #[arg(long)]
    crew_size: i32,
    /// Mark the ship as used.
    #[arg(long)]
    used: bool,
}

impl From<CreateArgs> for ShipInput {
    fn from(args: CreateArgs) -> Self {
        ShipInput {
            name: Patch::Value(args.name),
            planet: Patch::Value(args.planet),
            ship_type: Patch::Value(args.ship_type),
            prod_date: Patch::Value(args.prod_date),
            is_used: Patch::Value(args.used),
            speed: Patch::Value(args.speed),
            crew_size: Patch::Value(args.crew_size),
        }
    }
}

#[derive(Args, Clone, Debug)]
struct UpdateArgs {
    /// Ship identifier.
    id: i64,
    /// New name.
    #[arg(long)]
    name: Option<String>,
    /// New planet.
    #[arg(long)]
    planet: Option<String>,
    /// New ship type.
    #[arg(long, value_parser = parse_ship_type)]
    ship_type: Option<ShipType>,
    /// New production date.
    #[arg(long, value_parser = parse_prod_date)]
    prod_date: Option<i64>,
    /// New speed.
    #[arg(long)]
    speed: Option<f64>,
    /// New crew size.
    #[arg(long)]
    crew_size: Option<i32>,
    /// Mark the ship used (`true`) or new (`false`).
    #[arg(long)]
    used: Option<bool>,
}

impl UpdateArgs {
    fn into_patch(self) -> (i64, ShipInput) {
        let patch = ShipInput {
            name: Patch::from(self.name),
            planet: Patch::from(self.planet),
            ship_type: Patch::from(self.ship_type),
            prod_date: Patch::from(self.prod_date),
            is_used: Patch::from(self.used),
            speed: Patch::from(self.speed),
            crew_size: Patch::from(self.crew_size),
        };
        (self.id, patch)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List ships matching filters, ordered and paged.
    List {
        #[command(flatten)]
        filter: FilterArgs,
        /// Sort key: ID, SPEED, DATE or RATING.
        #[arg(long, value_parser = parse_order)]
        order: Option<ShipOrder>,
        /// Zero-based page index.
        #[arg(long)]
        page_number: Option<i64>,
        /// Page length.
        #[arg(long)]
        page_size: Option<i64>,
    },
    /// Count ships matching filters.
    Count {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Show a single ship.
    Get {
        /// Ship identifier.
        id: i64,
    },
    /// Register a new ship.
    Create(CreateArgs),
    /// Change some fields of a ship.
    Update(UpdateArgs),
    /// Remove a ship.
    Delete {
        /// Ship identifier.
        id: i64,
    },
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let client = ShipClient::new(&cli.server_url)?;
    let output = execute(cli.command, &client, cli.format).await?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

#[cfg(test)]
fn main() {}

/// Run one command against the server and render its result.
async fn execute(command: Commands, client: &ShipClient, format: OutputFormat) -> CliResult<String> {
    match command {
        Commands::List {
            filter,
            order,
            page_number,
            page_size,
        } => {
            let paging = PageRequest {
                order,
                page_number,
                page_size,
            };
            let ships = client.list(&filter.into(), &paging).await?;
            render_ships(&ships, format)
        }
        Commands::Count { filter } => {
            let count = client.count(&filter.into()).await?;
            Ok(count.to_string())
        }
        Commands::Get { id } => render_ship(&client.get(id).await?, format),
        Commands::Create(args) => render_ship(&client.create(&args.into()).await?, format),
        Commands::Update(args) => {
            let (id, patch) = args.into_patch();
            render_ship(&client.update(id, &patch).await?, format)
        }
        Commands::Delete { id } => {
            client.delete(id).await?;
            match format {
                OutputFormat::Text => Ok(format!("Deleted ship {id}.")),
                OutputFormat::Json => Ok(serde_json::json!({ "deleted": id }).to_string()),
            }
        }
    }
}

fn parse_ship_type(raw: &str) -> Result<ShipType, String> {
    raw.trim()
        .to_ascii_uppercase()
        .parse()
        .map_err(|err: cosmoport_core::UnknownLabel| err.to_string())
}

fn parse_order(raw: &str) -> Result<ShipOrder, String> {
    raw.trim()
        .to_ascii_uppercase()
        .parse()
        .map_err(|err: cosmoport_core::UnknownLabel| err.to_string())
}

/// Parse a production date given as epoch milliseconds, RFC 3339 or `YYYY-MM-DD` (UTC midnight).
fn parse_prod_date(raw: &str) -> Result<i64, String> {
    let raw = raw.trim();
    if let Ok(millis) = raw.parse::<i64>() {
        return Ok(millis);
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.timestamp_millis());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis())
        .ok_or_else(|| format!("expected epoch milliseconds, RFC 3339 or YYYY-MM-DD, got `{raw}`"))
}

fn format_ship(ship: &Ship) -> String {
    let id = ship
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    let condition = if ship.is_used { "used" } else { "new" };
    format!(
        "#{id} {name} [{kind}] from {planet}, built {built}, {condition}, speed {speed:.2}, crew {crew}, rating {rating:.2}",
        name = ship.name,
        kind = ship.ship_type,
        planet = ship.planet,
        built = ship.prod_date.to_rfc3339_opts(SecondsFormat::Secs, true),
        speed = ship.speed,
        crew = ship.crew_size,
        rating = ship.rating,
    )
}

fn render_ship(ship: &Ship, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Text => Ok(format_ship(ship)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(ship)?),
    }
}

fn render_ships(ships: &[Ship], format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(ships)?),
        OutputFormat::Text => {
            if ships.is_empty() {
                return Ok("No ships found.".to_string());
            }
            let mut output = String::new();
            for ship in ships {
                writeln!(output, "{}", format_ship(ship))?;
            }
            Ok(output.trim_end().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;
    use serde_json::json;

    fn sample_ship() -> Ship {
        Ship {
            id: Some(3),
            name: "Orion".to_string(),
            planet: "Mars".to_string(),
            ship_type: ShipType::Merchant,
            prod_date: Utc.with_ymd_and_hms(3019, 1, 1, 0, 0, 0).unwrap(),
            is_used: false,
            speed: 0.5,
            crew_size: 10,
            rating: 40.0,
        }
    }

    #[test]
    fn parse_prod_date_accepts_all_forms() {
        let millis = Utc
            .with_ymd_and_hms(3019, 1, 1, 0, 0, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(parse_prod_date("33103209600000"), Ok(33_103_209_600_000));
        assert_eq!(parse_prod_date("3019-01-01"), Ok(millis));
        assert_eq!(parse_prod_date("3019-01-01T00:00:00Z"), Ok(millis));
        assert_eq!(parse_prod_date("3019-01-01T02:00:00+02:00"), Ok(millis));
        assert!(parse_prod_date("yesterday").is_err());
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!(parse_ship_type("military"), Ok(ShipType::Military));
        assert_eq!(parse_order("Rating"), Ok(ShipOrder::Rating));
        assert!(parse_ship_type("cruiser").is_err());
    }

    #[test]
    fn cli_parses_list_filters() {
        let cli = Cli::try_parse_from([
            "cosmoport",
            "list",
            "--ship-type",
            "merchant",
            "--used",
            "true",
            "--min-speed",
            "0.2",
            "--order",
            "speed",
            "--page-size",
            "5",
            "--format",
            "json",
        ])
        .expect("parse");

        assert_eq!(cli.format, OutputFormat::Json);
        let Commands::List {
            filter,
            order,
            page_size,
            page_number,
        } = cli.command
        else {
            panic!("expected list");
        };
        let filter = ShipFilter::from(filter);
        assert_eq!(filter.ship_type, Some(ShipType::Merchant));
        assert_eq!(filter.is_used, Some(true));
        assert_eq!(filter.min_speed, Some(0.2));
        assert_eq!(order, Some(ShipOrder::Speed));
        assert_eq!(page_size, Some(5));
        assert_eq!(page_number, None);
    }

    #[test]
    fn cli_update_builds_sparse_patch() {
        let cli = Cli::try_parse_from(["cosmoport", "update", "7", "--speed", "0.7"]).expect("parse");
        let Commands::Update(args) = cli.command else {
            panic!("expected update");
        };
        let (id, patch) = args.into_patch();

        assert_eq!(id, 7);
        assert_eq!(patch.speed, Patch::Value(0.7));
        assert!(patch.name.is_absent());
        assert!(patch.is_used.is_absent());
    }

    #[test]
    fn cli_create_requires_every_field() {
        assert!(Cli::try_parse_from(["cosmoport", "create", "--name", "A"]).is_err());

        let cli = Cli::try_parse_from([
            "cosmoport",
            "create",
            "--name",
            "A",
            "--planet",
            "P",
            "--ship-type",
            "TRANSPORT",
            "--prod-date",
            "2900-06-01",
            "--speed",
            "0.5",
            "--crew-size",
            "10",
        ])
        .expect("parse");
        let Commands::Create(args) = cli.command else {
            panic!("expected create");
        };
        let input = ShipInput::from(args);
        assert_eq!(input.is_used, Patch::Value(false));
        assert_eq!(input.ship_type, Patch::Value(ShipType::Transport));
    }

    #[test]
    fn render_text_and_json() {
        let ship = sample_ship();
        let text = render_ship(&ship, OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "#3 Orion [MERCHANT] from Mars, built 3019-01-01T00:00:00Z, new, speed 0.50, crew 10, rating 40.00"
        );

        let json: serde_json::Value =
            serde_json::from_str(&render_ship(&ship, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["shipType"], "MERCHANT");
        assert_eq!(json["prodDate"], 33_103_209_600_000_i64);

        assert_eq!(
            render_ships(&[], OutputFormat::Text).unwrap(),
            "No ships found."
        );
        assert_eq!(
            render_ships(&[ship.clone(), ship], OutputFormat::Text)
                .unwrap()
                .lines()
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn execute_count_and_create_against_server() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/rest/ships/count")
                    .query_param("isUsed", "true");
                then.status(200).body("4");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/rest/ships");
                then.status(400)
                    .json_body(json!({ "message": "Wrong speed!" }));
            })
            .await;
        let client = ShipClient::new(&server.base_url()).unwrap();

        let cli = Cli::try_parse_from(["cosmoport", "count", "--used", "true"]).unwrap();
        let output = execute(cli.command, &client, cli.format).await.unwrap();
        assert_eq!(output, "4");

        let cli = Cli::try_parse_from([
            "cosmoport",
            "create",
            "--name",
            "A",
            "--planet",
            "P",
            "--ship-type",
            "MERCHANT",
            "--prod-date",
            "3019-01-01",
            "--speed",
            "0.005",
            "--crew-size",
            "10",
        ])
        .unwrap();
        let err = execute(cli.command, &client, cli.format).await.unwrap_err();
        assert!(err.to_string().contains("Wrong speed!"));
    }
}
