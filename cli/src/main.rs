use crate::cli::{Args, Command, ConnectionArgs};
use anyhow::{bail, Context};
use clap::Parser;
use heritage_map::{
    ArticleClient, DesignationCatalog, FacetKey, FilterMenu, LanguageTag, Outline, OutlineClient,
    PresentationAdapter, Session, SiteDetails, Snapshot, StageOutcome,
};
use heritage_map_sparql::{EndpointConfig, HttpEndpoint, QueryPlan, QueryStage, ValuesClause};
use std::io::{self, stdout, Write};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let catalog = DesignationCatalog::philippine();
    let mut out = stdout().lock();
    match args.command {
        Command::Queries => print_queries(&mut out, &catalog, &args.connection.language)?,
        Command::Summary => {
            let session = load(&args.connection, catalog).await?;
            print_summary(&mut out, &session)?;
        }
        Command::List { facet } => {
            let session = load(&args.connection, catalog).await?;
            let Some(facet) = FacetKey::parse(&facet, session.catalog()) else {
                bail!("'{facet}' is neither 'all', a designation type nor an organization")
            };
            print_list(&mut out, &session, &facet)?;
        }
        Command::Site {
            id,
            extract,
            outline,
        } => {
            let session = load(&args.connection, catalog).await?;
            let record = session
                .record_for_fragment(&id)
                .with_context(|| format!("{id} is not a designated heritage site"))?;
            let details =
                SiteDetails::new(record, session.store(), session.catalog(), session.language());
            print_details(&mut out, &details)?;
            if extract {
                if let Some((title, _)) = &details.article {
                    let client =
                        ArticleClient::new(session.language(), user_agent(&args.connection))?;
                    match client.first_paragraph(title).await? {
                        Some(paragraph) => writeln!(out, "\n{paragraph}")?,
                        None => writeln!(out, "\nThe article has no introduction.")?,
                    }
                } else {
                    writeln!(out, "\nThis site has no Wikipedia article.")?;
                }
            }
            if outline {
                let client = OutlineClient::new(user_agent(&args.connection));
                let outline = client
                    .outline(&details.id)
                    .await
                    .context("Could not look up the outline on OpenStreetMap")?;
                print_outline(&mut out, outline.as_ref())?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn user_agent(connection: &ConnectionArgs) -> String {
    connection
        .user_agent
        .clone()
        .unwrap_or_else(|| EndpointConfig::default().user_agent)
}

/// Logs the progress of a load.
struct ProgressLog;

impl PresentationAdapter for ProgressLog {
    fn data_loaded(&mut self, snapshot: Snapshot<'_>) {
        let located = snapshot
            .index
            .all()
            .map_or(0, |entry| entry.marker_site_ids.len());
        info!(
            sites = snapshot.index.count(&FacetKey::All),
            located, "sites loaded"
        );
    }

    fn enriched(&mut self, stage: QueryStage, _snapshot: Snapshot<'_>) {
        info!(%stage, "sites enriched");
    }
}

async fn load(
    connection: &ConnectionArgs,
    catalog: DesignationCatalog,
) -> anyhow::Result<Session<HttpEndpoint>> {
    let config = EndpointConfig {
        url: connection.endpoint.clone(),
        user_agent: user_agent(connection),
        timeout: connection.timeout_secs.map(Duration::from_secs),
    };
    let endpoint = HttpEndpoint::new(config).context("Could not create the HTTP client")?;
    let mut session = Session::new(endpoint, catalog, connection.language.clone());
    let report = session
        .load(&mut ProgressLog)
        .await
        .with_context(|| format!("Could not load sites from {}", connection.endpoint))?;
    for (stage, outcome) in &report.stages {
        if let StageOutcome::Failed(error) = outcome {
            warn!(%stage, "some details are missing: {error}");
        }
    }
    Ok(session)
}

fn print_queries(
    out: &mut impl Write,
    catalog: &DesignationCatalog,
    language: &LanguageTag,
) -> io::Result<()> {
    let plan = QueryPlan::new(catalog, language.clone());
    let scope = ValuesClause::new("site", ["Q1153"]);
    for query in [
        plan.discovery(),
        plan.coordinates(&scope),
        plan.designation_details(&scope),
        plan.media(&scope),
    ] {
        writeln!(out, "# {}\n# {}\n{}", query.stage, query.gui_url(), query.text)?;
    }
    Ok(())
}

fn print_summary(out: &mut impl Write, session: &Session<HttpEndpoint>) -> io::Result<()> {
    let menu = FilterMenu::new(session.catalog(), session.index());
    writeln!(out, "All heritage sites: {}", menu.all_count)?;
    for group in &menu.groups {
        writeln!(out, "\n{}", group.label)?;
        for option in &group.options {
            writeln!(out, "  {:<12} {} ({})", option.facet, option.name, option.count)?;
        }
    }
    Ok(())
}

fn print_list(
    out: &mut impl Write,
    session: &Session<HttpEndpoint>,
    facet: &FacetKey,
) -> io::Result<()> {
    let Some(entry) = session.index().get(facet) else {
        return writeln!(out, "No sites for {facet}");
    };
    writeln!(
        out,
        "{} sites, {} on the map",
        entry.total_count,
        entry.marker_site_ids.len()
    )?;
    for item in &entry.list_items {
        writeln!(out, "{:<12} {}", item.site, item.label)?;
    }
    Ok(())
}

fn print_details(out: &mut impl Write, details: &SiteDetails) -> io::Result<()> {
    writeln!(out, "{}\n{}", details.title, details.wikidata_url)?;
    if let Some(coordinates) = details.coordinates {
        writeln!(out, "Location: {coordinates}")?;
    }
    match &details.image {
        Some((_, url)) => writeln!(out, "Photo: {url}")?,
        None => writeln!(out, "No photo available")?,
    }
    if let Some((_, url)) = &details.article {
        writeln!(out, "Wikipedia: {url}")?;
    }
    if !details.members.is_empty() {
        writeln!(out, "\nParts")?;
        for (id, title) in &details.members {
            writeln!(out, "  {id:<12} {title}")?;
        }
    }

    writeln!(out, "\nDesignations")?;
    for designation in &details.designations {
        writeln!(out, "  {} ({})", designation.name, designation.organization)?;
        if let Some((id, title)) = &designation.part_of {
            writeln!(out, "    As part of {title} ({id})")?;
        }
        match (&designation.declaration, &designation.declared) {
            (Some(declaration), declared) => {
                if let Some(title) = &declaration.title {
                    write!(out, "    Declaration: {title}")?;
                    match declared {
                        Some(declared) => writeln!(out, "; approved {declared}")?,
                        None => writeln!(out)?,
                    }
                }
                for url in [
                    &declaration.wikidata_url,
                    &declaration.text_url,
                    &declaration.scan_url,
                ]
                .into_iter()
                .flatten()
                {
                    writeln!(out, "      {url}")?;
                }
            }
            (None, Some(declared)) => writeln!(out, "    Declared: {declared}")?,
            (None, None) => {}
        }
    }
    Ok(())
}

fn print_outline(out: &mut impl Write, outline: Option<&Outline>) -> io::Result<()> {
    let Some(outline) = outline else {
        return writeln!(out, "\nOpenStreetMap has no outline for this site.");
    };
    writeln!(out, "\nOutline")?;
    for feature in &outline.features {
        let points: usize = feature.paths.iter().map(Vec::len).sum();
        write!(out, "  {} {}", feature.kind, feature.osm_id)?;
        if let Some(name) = &feature.name {
            write!(out, " ({name})")?;
        }
        writeln!(out, ", {points} points\n    {}", feature.osm_url())?;
    }
    if let Some(bounds) = outline.bounds() {
        writeln!(out, "  Bounds: {} to {}", bounds.south_west, bounds.north_east)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use anyhow::Result;
    use assert_cmd::Command;
    use heritage_map::{DeclarationView, DesignationView};
    use heritage_map_model::{DesignationTypeId, SiteId};
    use predicates::prelude::*;

    fn cli_command() -> Command {
        let mut command = Command::new(env!("CARGO"));
        command
            .arg("run")
            .arg("--bin")
            .arg("heritage-map")
            .arg("--");
        command
    }

    #[test]
    fn cli_help() {
        cli_command()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("heritage sites"));
    }

    #[test]
    fn cli_queries() {
        cli_command()
            .arg("queries")
            .arg("--language")
            .arg("tl")
            .assert()
            .success()
            .stdout(predicate::str::contains("# discovery"))
            .stdout(predicate::str::contains("wikibase:language \"tl\""))
            .stdout(predicate::str::contains("https://query.wikidata.org/#"));
    }

    #[test]
    fn queries_are_printed_with_links() -> Result<()> {
        let mut out = Vec::new();
        print_queries(&mut out, &DesignationCatalog::philippine(), &LanguageTag::english())?;
        let text = String::from_utf8(out)?;
        assert_eq!(text.matches("https://query.wikidata.org/#").count(), 4);
        assert!(text.contains("VALUES ?site { wd:Q1153 }"));
        Ok(())
    }

    #[test]
    fn details_list_declarations() -> Result<()> {
        let details = SiteDetails {
            id: SiteId::new("Q1")?,
            title: "Intramuros".to_owned(),
            wikidata_url: "https://www.wikidata.org/wiki/Q1".to_owned(),
            coordinates: None,
            image: None,
            article: None,
            members: Vec::new(),
            designations: vec![DesignationView {
                type_id: DesignationTypeId::new("Q23677505")?,
                name: "National Historical Landmark".to_owned(),
                organization: "National Historical Commission of the Philippines".to_owned(),
                declared: Some("1951".to_owned()),
                declaration: Some(DeclarationView {
                    title: Some("Resolution No. 1".to_owned()),
                    wikidata_url: Some("https://www.wikidata.org/wiki/Q100".to_owned()),
                    text_url: None,
                    scan_url: None,
                }),
                part_of: None,
            }],
        };
        let mut out = Vec::new();
        print_details(&mut out, &details)?;
        let text = String::from_utf8(out)?;
        assert!(text.contains("No photo available"));
        assert!(text.contains("Declaration: Resolution No. 1; approved 1951"));
        assert!(text.contains("      https://www.wikidata.org/wiki/Q100"));
        Ok(())
    }

    #[test]
    fn outlines_list_features() -> Result<()> {
        let body = br#"{"elements": [
            {"type": "way", "id": 10, "nodes": [1, 2], "tags": {"name": "Fort Santiago", "wikidata": "Q1"}},
            {"type": "node", "id": 1, "lat": 14.594, "lon": 120.97},
            {"type": "node", "id": 2, "lat": 14.596, "lon": 120.971}
        ]}"#;
        let outline = Outline::from_overpass_json(&SiteId::new("Q1")?, body)?;
        let mut out = Vec::new();
        print_outline(&mut out, outline.as_ref())?;
        let text = String::from_utf8(out)?;
        assert!(text.contains("  way 10 (Fort Santiago), 2 points"));
        assert!(text.contains("https://www.openstreetmap.org/way/10"));
        assert!(text.contains("Bounds: 14.59400, 120.97000 to 14.59600, 120.97100"));

        let mut out = Vec::new();
        print_outline(&mut out, None)?;
        assert!(String::from_utf8(out)?.contains("no outline"));
        Ok(())
    }
}
