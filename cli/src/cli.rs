use clap::{Parser, Subcommand, ValueHint};
use heritage_map::LanguageTag;
use heritage_map_sparql::WIKIDATA_SPARQL_ENDPOINT;
use url::Url;

#[derive(Parser)]
#[command(version, name = "heritage-map")]
/// Explore the Philippine heritage sites recorded in Wikidata
pub struct Args {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args)]
pub struct ConnectionArgs {
    /// SPARQL endpoint to query
    #[arg(long, global = true, default_value = WIKIDATA_SPARQL_ENDPOINT, value_hint = ValueHint::Url)]
    pub endpoint: Url,
    /// Language of labels, Wikipedia articles and Wikisource texts
    #[arg(long, global = true, default_value = "en")]
    pub language: LanguageTag,
    /// User agent sent to Wikimedia services
    ///
    /// Wikimedia asks clients to identify themselves with contact information.
    #[arg(long, global = true)]
    pub user_agent: Option<String>,
    /// Abort requests that take longer than this many seconds
    ///
    /// By default requests never time out.
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load all sites and print the filter menu with the number of sites per designation
    Summary,
    /// Load all sites and list those of one facet, sorted by title
    List {
        /// "all", a designation type (e.g. Q9259) or an organization (e.g. NHCP)
        #[arg(long, default_value = "all")]
        facet: String,
    },
    /// Load all sites and print the details of one of them
    Site {
        /// Wikidata item of the site, e.g. Q1153 or #Q1153
        id: String,
        /// Also fetch the introduction of the site's Wikipedia article
        #[arg(long)]
        extract: bool,
        /// Also look up the outline of the site on OpenStreetMap
        #[arg(long)]
        outline: bool,
    },
    /// Print the SPARQL queries used to load the sites with links to the query service
    Queries,
}
