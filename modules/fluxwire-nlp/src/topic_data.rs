//! Topic taxonomy for energy-transition news tagging.
//! Each topic maps to (positive keywords, negative keywords). Negative
//! keywords only demote that topic's score; they never blacklist an article.

pub struct TopicEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub positive: &'static [&'static str],
    pub negative: &'static [&'static str],
}

pub const TOPICS: &[TopicEntry] = &[
    TopicEntry {
        id: "policy_regulation",
        name: "Policy & Regulation",
        positive: &[
            "policy", "regulation", "regulatory", "legislation", "law", "mandate",
            "government", "federal", "state", "national", "parliament", "congress",
            "directive", "compliance", "subsidy", "subsidies", "tax credit",
            "incentive", "carbon tax", "emissions trading", "cap and trade",
            "net zero", "climate target", "climate goal", "climate pledge",
            "paris agreement", "cop27", "cop28", "cop29", "climate summit",
            "renewable energy standard", "res", "clean energy standard",
            "energy policy", "climate policy", "environmental policy",
        ],
        negative: &["technical", "engineering", "manufacturing"],
    },
    TopicEntry {
        id: "power_grid",
        name: "Power Grid & Infrastructure",
        positive: &[
            "grid", "power grid", "electricity grid", "transmission", "distribution",
            "grid infrastructure", "grid modernization", "smart grid",
            "interconnection", "interconnector", "grid connection",
            "transmission line", "power line", "substation",
            "grid operator", "grid stability", "grid reliability",
            "grid congestion", "grid capacity", "grid expansion",
            "energy storage grid", "grid scale", "utility scale",
            "load balancing", "frequency regulation", "ancillary services",
            "demand response", "virtual power plant", "vpp",
        ],
        negative: &["solar panel", "wind turbine", "battery cell"],
    },
    TopicEntry {
        id: "renewables_solar",
        name: "Solar Energy",
        positive: &[
            "solar", "photovoltaic", "pv", "solar panel", "solar farm",
            "solar power", "solar energy", "solar project", "solar plant",
            "solar installation", "rooftop solar", "utility scale solar",
            "concentrated solar", "csp", "solar thermal",
            "solar cell", "solar module", "bifacial", "perovskite",
            "solar capacity", "solar generation", "solar irradiance",
        ],
        negative: &["wind", "battery", "hydrogen"],
    },
    TopicEntry {
        id: "renewables_wind",
        name: "Wind Energy",
        positive: &[
            "wind", "wind power", "wind energy", "wind farm", "wind turbine",
            "wind project", "wind installation", "wind capacity",
            "onshore wind", "offshore wind", "floating wind",
            "wind generation", "wind developer", "wind industry",
            "turbine blade", "nacelle", "wind speed", "capacity factor",
        ],
        negative: &["solar", "battery", "hydrogen"],
    },
    TopicEntry {
        id: "storage_batteries",
        name: "Battery Storage",
        positive: &[
            "battery", "batteries", "energy storage", "battery storage",
            "lithium ion", "lithium-ion", "li-ion", "solid state battery",
            "battery cell", "battery pack", "battery system",
            "battery technology", "battery chemistry", "battery capacity",
            "battery manufacturer", "battery plant", "gigafactory",
            "flow battery", "vanadium", "grid scale storage",
            "stationary storage", "utility scale battery",
            "charge", "discharge", "cycling", "degradation",
        ],
        negative: &["electric vehicle", "ev", "car", "automotive"],
    },
    TopicEntry {
        id: "hydrogen",
        name: "Hydrogen & Fuel Cells",
        positive: &[
            "hydrogen", "h2", "green hydrogen", "blue hydrogen", "grey hydrogen",
            "hydrogen production", "electrolyzer", "electrolysis",
            "hydrogen fuel", "hydrogen economy", "hydrogen strategy",
            "fuel cell", "hydrogen storage", "hydrogen transport",
            "ammonia", "synthetic fuel", "e-fuel", "power to gas",
            "hydrogen pipeline", "hydrogen infrastructure",
        ],
        negative: &["battery", "solar", "wind"],
    },
    TopicEntry {
        id: "ev_transport",
        name: "Electric Vehicles & Transport",
        positive: &[
            "electric vehicle", "ev", "evs", "electric car", "electric truck",
            "electric bus", "battery electric vehicle", "bev",
            "plug-in hybrid", "phev", "hybrid electric",
            "charging station", "charging infrastructure", "ev charger",
            "fast charging", "dc fast charging", "level 2 charging",
            "vehicle to grid", "v2g", "bidirectional charging",
            "automotive", "automobile", "passenger vehicle",
            "tesla", "rivian", "lucid", "nio", "byd electric",
            "ev adoption", "ev sales", "ev market", "ev battery",
        ],
        negative: &["stationary storage", "grid scale"],
    },
    TopicEntry {
        id: "carbon_markets_ccus",
        name: "Carbon Markets & CCUS",
        positive: &[
            "carbon capture", "ccs", "ccus", "carbon storage",
            "carbon sequestration", "direct air capture", "dac",
            "carbon removal", "carbon credit", "carbon offset",
            "carbon market", "carbon trading", "carbon price",
            "emissions reduction", "co2 capture", "carbon dioxide removal",
            "negative emissions", "carbon neutral", "carbon negative",
            "voluntary carbon market", "compliance carbon market",
        ],
        negative: &[],
    },
    TopicEntry {
        id: "oil_gas_transition",
        name: "Oil & Gas Transition",
        positive: &[
            "oil and gas", "fossil fuel", "petroleum", "natural gas",
            "oil company", "gas company", "oil major", "supermajor",
            "bp", "shell", "exxon", "chevron", "totalenergies", "equinor",
            "energy transition", "diversification", "renewable transition",
            "fossil fuel phase out", "stranded assets",
            "oil production", "gas production", "upstream", "downstream",
            "refinery", "petrochemical", "lng", "liquefied natural gas",
        ],
        negative: &["renewable only", "clean energy only"],
    },
    TopicEntry {
        id: "corporate_finance",
        name: "Corporate & Finance",
        positive: &[
            "investment", "financing", "funding", "capital",
            "merger", "acquisition", "m&a", "deal", "transaction",
            "ipo", "initial public offering", "private equity", "venture capital",
            "stock", "share price", "valuation", "market cap",
            "earnings", "revenue", "profit", "loss", "financial results",
            "investor", "shareholder", "dividend", "bond", "debt",
            "fundraising", "capital raise", "series a", "series b",
            "billion dollar", "million dollar", "usd", "eur",
        ],
        negative: &[],
    },
    TopicEntry {
        id: "critical_minerals_supply_chain",
        name: "Critical Minerals & Supply Chain",
        positive: &[
            "lithium", "cobalt", "nickel", "rare earth", "graphite",
            "copper", "manganese", "vanadium",
            "mining", "mineral", "supply chain", "raw material",
            "critical mineral", "strategic mineral",
            "mineral processing", "refining", "smelting",
            "mineral exploration", "mineral deposit", "mineral reserves",
            "supply security", "supply risk", "geopolitical risk",
            "mineral demand", "mineral shortage", "mineral price",
        ],
        negative: &[],
    },
];

/// Display name for a topic id; falls back to the id.
pub fn topic_name(topic_id: &str) -> &str {
    TOPICS
        .iter()
        .find(|t| t.id == topic_id)
        .map(|t| t.name)
        .unwrap_or(topic_id)
}

/// True when the id belongs to the taxonomy.
pub fn is_known_topic(topic_id: &str) -> bool {
    TOPICS.iter().any(|t| t.id == topic_id)
}
