//! Country reference data for tagging.
//! Maps country names, demonyms, cities, and abbreviations to ISO-3166
//! alpha-2 codes.

/// ISO code -> keywords (names, demonyms, cities, abbreviations).
pub const COUNTRY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "US",
        &[
            "united states", "usa", "u.s.", "u.s.a", "america", "american", "americans",
            "washington dc", "new york", "california", "texas", "florida",
        ],
    ),
    (
        "GB",
        &[
            "united kingdom", "uk", "u.k.", "britain", "great britain", "british",
            "england", "english", "scotland", "scottish", "wales", "welsh",
            "northern ireland", "london", "manchester", "birmingham",
        ],
    ),
    (
        "DE",
        &[
            "germany", "german", "germans", "deutschland",
            "berlin", "munich", "hamburg", "frankfurt",
        ],
    ),
    ("FR", &["france", "french", "paris", "lyon", "marseille"]),
    (
        "CN",
        &[
            "china", "chinese", "beijing", "shanghai", "guangzhou", "shenzhen",
            "prc", "people's republic of china",
        ],
    ),
    (
        "IN",
        &[
            "india", "indian", "indians", "new delhi", "delhi", "mumbai",
            "bangalore", "bengaluru", "hyderabad",
        ],
    ),
    ("JP", &["japan", "japanese", "tokyo", "osaka", "kyoto"]),
    (
        "KR",
        &[
            "south korea", "korea", "korean", "koreans", "seoul", "busan",
            "republic of korea", "rok",
        ],
    ),
    (
        "KP",
        &["north korea", "dprk", "pyongyang", "democratic people's republic of korea"],
    ),
    (
        "AU",
        &[
            "australia", "australian", "australians", "sydney", "melbourne",
            "brisbane", "perth", "canberra",
        ],
    ),
    (
        "CA",
        &[
            "canada", "canadian", "canadians", "toronto", "montreal", "vancouver",
            "ottawa", "calgary",
        ],
    ),
    ("ES", &["spain", "spanish", "madrid", "barcelona", "seville"]),
    (
        "IT",
        &[
            "italy", "italian", "italians", "rome", "milan", "naples",
            "florence", "venice",
        ],
    ),
    (
        "NL",
        &["netherlands", "dutch", "holland", "amsterdam", "rotterdam", "the hague"],
    ),
    ("BE", &["belgium", "belgian", "belgians", "brussels", "antwerp"]),
    ("PL", &["poland", "polish", "poles", "warsaw", "krakow", "gdansk"]),
    ("SE", &["sweden", "swedish", "swedes", "stockholm", "gothenburg"]),
    ("NO", &["norway", "norwegian", "norwegians", "oslo", "bergen"]),
    ("DK", &["denmark", "danish", "danes", "copenhagen"]),
    (
        "BR",
        &[
            "brazil", "brazilian", "brazilians", "brasilia", "sao paulo",
            "rio de janeiro", "rio",
        ],
    ),
    ("MX", &["mexico", "mexican", "mexicans", "mexico city", "guadalajara"]),
    ("AR", &["argentina", "argentinian", "argentinians", "buenos aires"]),
    ("CL", &["chile", "chilean", "chileans", "santiago"]),
    (
        "ZA",
        &[
            "south africa", "south african", "south africans",
            "johannesburg", "cape town", "pretoria", "durban",
        ],
    ),
    ("SA", &["saudi arabia", "saudi", "saudis", "riyadh", "jeddah"]),
    (
        "AE",
        &["united arab emirates", "uae", "u.a.e", "emirates", "dubai", "abu dhabi"],
    ),
    ("IL", &["israel", "israeli", "israelis", "jerusalem", "tel aviv"]),
    ("TR", &["turkey", "turkish", "turks", "ankara", "istanbul"]),
    (
        "RU",
        &[
            "russia", "russian", "russians", "moscow", "st petersburg",
            "petersburg", "soviet", "ussr",
        ],
    ),
    ("UA", &["ukraine", "ukrainian", "ukrainians", "kyiv", "kiev", "odessa"]),
    ("EG", &["egypt", "egyptian", "egyptians", "cairo"]),
    ("NG", &["nigeria", "nigerian", "nigerians", "lagos", "abuja"]),
    ("KE", &["kenya", "kenyan", "kenyans", "nairobi"]),
    ("ID", &["indonesia", "indonesian", "indonesians", "jakarta"]),
    ("MY", &["malaysia", "malaysian", "malaysians", "kuala lumpur"]),
    ("SG", &["singapore", "singaporean", "singaporeans"]),
    ("VN", &["vietnam", "vietnamese", "hanoi", "ho chi minh"]),
    ("TH", &["thailand", "thai", "bangkok"]),
    ("PH", &["philippines", "filipino", "filipinos", "manila"]),
    (
        "NZ",
        &[
            "new zealand", "new zealander", "new zealanders", "kiwi", "kiwis",
            "wellington", "auckland",
        ],
    ),
    ("IE", &["ireland", "irish", "dublin"]),
    ("PT", &["portugal", "portuguese", "lisbon", "porto"]),
    ("GR", &["greece", "greek", "greeks", "athens"]),
    ("AT", &["austria", "austrian", "austrians", "vienna"]),
    ("CH", &["switzerland", "swiss", "zurich", "geneva", "bern"]),
    ("FI", &["finland", "finnish", "finns", "helsinki"]),
    ("CZ", &["czech republic", "czech", "czechs", "czechia", "prague"]),
    ("HU", &["hungary", "hungarian", "hungarians", "budapest"]),
    ("RO", &["romania", "romanian", "romanians", "bucharest"]),
    ("GE", &["georgia", "tbilisi", "georgian government"]),
];

/// Regions and blocs that are useful metadata but never country tags.
pub const REGION_KEYWORDS: &[(&str, &[&str])] = &[(
    "EU",
    &[
        "european union", "eu", "e.u.", "brussels", "european commission",
        "european parliament", "eurozone",
    ],
)];

/// A deterministic disambiguation rule: when `evidence_terms` appear in the
/// text, the trigger country's score is zeroed.
pub struct DisambiguationRule {
    pub trigger_country: &'static str,
    pub evidence_terms: &'static [&'static str],
}

/// Known keyword collisions. "Georgia" the US state drowns out GE whenever
/// state indicators are present.
pub const DISAMBIGUATION_RULES: &[DisambiguationRule] = &[DisambiguationRule {
    trigger_country: "GE",
    evidence_terms: &["atlanta", "savannah", "peach state", "georgian state"],
}];

/// Human-readable country name for a code; falls back to the code itself.
pub fn country_name(code: &str) -> &str {
    match code {
        "US" => "United States",
        "GB" => "United Kingdom",
        "DE" => "Germany",
        "FR" => "France",
        "ES" => "Spain",
        "IT" => "Italy",
        "NL" => "Netherlands",
        "BE" => "Belgium",
        "SE" => "Sweden",
        "NO" => "Norway",
        "DK" => "Denmark",
        "FI" => "Finland",
        "PL" => "Poland",
        "CN" => "China",
        "IN" => "India",
        "JP" => "Japan",
        "KR" => "South Korea",
        "KP" => "North Korea",
        "AU" => "Australia",
        "NZ" => "New Zealand",
        "CA" => "Canada",
        "MX" => "Mexico",
        "BR" => "Brazil",
        "AR" => "Argentina",
        "CL" => "Chile",
        "ZA" => "South Africa",
        "NG" => "Nigeria",
        "KE" => "Kenya",
        "EG" => "Egypt",
        "SA" => "Saudi Arabia",
        "AE" => "United Arab Emirates",
        "IL" => "Israel",
        "TR" => "Turkey",
        "RU" => "Russia",
        "UA" => "Ukraine",
        "GE" => "Georgia",
        "VN" => "Vietnam",
        "TH" => "Thailand",
        "ID" => "Indonesia",
        "MY" => "Malaysia",
        "SG" => "Singapore",
        "PH" => "Philippines",
        "IE" => "Ireland",
        "PT" => "Portugal",
        "GR" => "Greece",
        "AT" => "Austria",
        "CH" => "Switzerland",
        "CZ" => "Czech Republic",
        "HU" => "Hungary",
        "RO" => "Romania",
        other => other,
    }
}
