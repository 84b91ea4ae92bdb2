//! Curated default source set. Idempotent: sources already present by name
//! are skipped, so seeding can run on every deploy.

use tracing::info;

use fluxwire_common::SourceKind;
use fluxwire_store::Store;

struct SeedSource {
    name: &'static str,
    kind: SourceKind,
    locator: &'static str,
}

const DEFAULT_SOURCES: &[SeedSource] = &[
    // Direct publisher feeds
    SeedSource {
        name: "Financial Times - Energy",
        kind: SourceKind::Paywalled,
        locator: "https://www.ft.com/energy?format=rss",
    },
    SeedSource {
        name: "Energy Live News",
        kind: SourceKind::Rss,
        locator: "https://www.energylivenews.com/feed/",
    },
    SeedSource {
        name: "Energy Storage News",
        kind: SourceKind::Rss,
        locator: "https://www.energy-storage.news/feed/",
    },
    SeedSource {
        name: "Renewables Now",
        kind: SourceKind::Rss,
        locator: "https://renewablesnow.com/feed/",
    },
    SeedSource {
        name: "Renewable Energy World",
        kind: SourceKind::Rss,
        locator: "https://www.renewableenergyworld.com/feed/",
    },
    // Google News topic searches (resolved through the redirect resolver)
    SeedSource {
        name: "Google News - Renewable Energy",
        kind: SourceKind::Rss,
        locator: "https://news.google.com/rss/search?q=renewable+energy&hl=en-US&gl=US&ceid=US:en",
    },
    SeedSource {
        name: "Google News - Solar Energy",
        kind: SourceKind::Rss,
        locator: "https://news.google.com/rss/search?q=solar+energy+OR+solar+power&hl=en-US&gl=US&ceid=US:en",
    },
    SeedSource {
        name: "Google News - Wind Energy",
        kind: SourceKind::Rss,
        locator: "https://news.google.com/rss/search?q=wind+energy+OR+wind+power&hl=en-US&gl=US&ceid=US:en",
    },
    SeedSource {
        name: "Google News - Energy Transition",
        kind: SourceKind::Rss,
        locator: "https://news.google.com/rss/search?q=energy+transition&hl=en-US&gl=US&ceid=US:en",
    },
    SeedSource {
        name: "Google News - Electric Vehicles",
        kind: SourceKind::Rss,
        locator: "https://news.google.com/rss/search?q=electric+vehicles+OR+EV&hl=en-US&gl=US&ceid=US:en",
    },
    SeedSource {
        name: "Google News - Hydrogen Energy",
        kind: SourceKind::Rss,
        locator: "https://news.google.com/rss/search?q=hydrogen+energy+OR+green+hydrogen&hl=en-US&gl=US&ceid=US:en",
    },
    SeedSource {
        name: "Google News - Battery Storage",
        kind: SourceKind::Rss,
        locator: "https://news.google.com/rss/search?q=battery+storage+OR+energy+storage&hl=en-US&gl=US&ceid=US:en",
    },
    SeedSource {
        name: "Google News - Carbon Emissions",
        kind: SourceKind::Rss,
        locator: "https://news.google.com/rss/search?q=carbon+emissions+OR+net+zero&hl=en-US&gl=US&ceid=US:en",
    },
    // Scraped sites without feeds. NESO is UK-national, so its articles are
    // pinned to GB instead of running the country tagger.
    SeedSource {
        name: "NESO News",
        kind: SourceKind::WebScraper,
        locator: "neso",
    },
];

/// Insert any default sources that are not present yet.
/// Returns (added, skipped).
pub async fn seed_default_sources(store: &Store) -> anyhow::Result<(u32, u32)> {
    let mut added = 0u32;
    let mut skipped = 0u32;

    for seed in DEFAULT_SOURCES {
        if store.source_name_exists(seed.name, None).await? {
            skipped += 1;
            continue;
        }

        let country_override = match seed.name {
            "NESO News" => Some("GB"),
            _ => None,
        };

        store
            .create_source(seed.name, seed.kind, seed.locator, true, country_override)
            .await?;
        info!(name = seed.name, kind = %seed.kind, "seeded source");
        added += 1;
    }

    info!(added, skipped, "source seeding complete");
    Ok((added, skipped))
}
