//! ISO 3166-1 alpha-2 country table.
//!
//! Entry order is the tie-break order for partial matches, so it stays
//! alphabetical by code.

/// One country: its alpha-2 code, English short name and accepted aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryEntry {
    pub code: &'static str,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

macro_rules! country {
    ($code:literal, $name:literal) => {
        CountryEntry { code: $code, name: $name, aliases: &[] }
    };
    ($code:literal, $name:literal, [$($alias:literal),* $(,)?]) => {
        CountryEntry { code: $code, name: $name, aliases: &[$($alias),*] }
    };
}

pub const COUNTRIES: &[CountryEntry] = &[
    country!("AD", "Andorra"),
    country!("AE", "United Arab Emirates", ["uae", "emirates"]),
    country!("AF", "Afghanistan"),
    country!("AG", "Antigua and Barbuda", ["antigua"]),
    country!("AI", "Anguilla"),
    country!("AL", "Albania", ["shqiperia"]),
    country!("AM", "Armenia"),
    country!("AO", "Angola"),
    country!("AQ", "Antarctica"),
    country!("AR", "Argentina"),
    country!("AS", "American Samoa"),
    country!("AT", "Austria", ["osterreich"]),
    country!("AU", "Australia"),
    country!("AW", "Aruba"),
    country!("AZ", "Azerbaijan"),
    country!("BA", "Bosnia and Herzegovina", ["bosnia"]),
    country!("BB", "Barbados"),
    country!("BD", "Bangladesh"),
    country!("BE", "Belgium", ["belgique", "belgie"]),
    country!("BF", "Burkina Faso"),
    country!("BG", "Bulgaria"),
    country!("BH", "Bahrain"),
    country!("BI", "Burundi"),
    country!("BJ", "Benin"),
    country!("BN", "Brunei", ["brunei darussalam"]),
    country!("BO", "Bolivia"),
    country!("BR", "Brazil", ["brasil"]),
    country!("BS", "Bahamas", ["the bahamas"]),
    country!("BT", "Bhutan"),
    country!("BW", "Botswana"),
    country!("BY", "Belarus"),
    country!("BZ", "Belize"),
    country!("CA", "Canada"),
    country!("CD", "Democratic Republic of the Congo", ["dr congo", "drc", "congo kinshasa", "zaire"]),
    country!("CF", "Central African Republic"),
    country!("CG", "Republic of the Congo", ["congo", "congo brazzaville"]),
    country!("CH", "Switzerland", ["schweiz", "suisse"]),
    country!("CI", "Cote d'Ivoire", ["ivory coast"]),
    country!("CL", "Chile"),
    country!("CM", "Cameroon"),
    country!("CN", "China", ["prc", "people's republic of china"]),
    country!("CO", "Colombia"),
    country!("CR", "Costa Rica"),
    country!("CU", "Cuba"),
    country!("CV", "Cabo Verde", ["cape verde"]),
    country!("CY", "Cyprus"),
    country!("CZ", "Czechia", ["czech republic"]),
    country!("DE", "Germany", ["deutschland", "alemania"]),
    country!("DJ", "Djibouti"),
    country!("DK", "Denmark", ["danmark"]),
    country!("DM", "Dominica"),
    country!("DO", "Dominican Republic"),
    country!("DZ", "Algeria"),
    country!("EC", "Ecuador"),
    country!("EE", "Estonia"),
    country!("EG", "Egypt"),
    country!("EH", "Western Sahara"),
    country!("ER", "Eritrea"),
    country!("ES", "Spain", ["espana", "espanya"]),
    country!("ET", "Ethiopia"),
    country!("FI", "Finland", ["suomi"]),
    country!("FJ", "Fiji"),
    country!("FM", "Micronesia", ["federated states of micronesia"]),
    country!("FO", "Faroe Islands"),
    country!("FR", "France", ["francia"]),
    country!("GA", "Gabon"),
    country!("GB", "United Kingdom", ["uk", "great britain", "britain", "england", "scotland", "wales"]),
    country!("GD", "Grenada"),
    country!("GE", "Georgia"),
    country!("GF", "French Guiana"),
    country!("GH", "Ghana"),
    country!("GL", "Greenland"),
    country!("GM", "Gambia", ["the gambia"]),
    country!("GN", "Guinea"),
    country!("GQ", "Equatorial Guinea"),
    country!("GR", "Greece", ["hellas"]),
    country!("GT", "Guatemala"),
    country!("GU", "Guam"),
    country!("GW", "Guinea-Bissau"),
    country!("GY", "Guyana"),
    country!("HN", "Honduras"),
    country!("HR", "Croatia", ["hrvatska"]),
    country!("HT", "Haiti"),
    country!("HU", "Hungary", ["magyarorszag"]),
    country!("ID", "Indonesia"),
    country!("IE", "Ireland", ["eire"]),
    country!("IL", "Israel"),
    country!("IN", "India", ["bharat"]),
    country!("IQ", "Iraq"),
    country!("IR", "Iran", ["persia"]),
    country!("IS", "Iceland"),
    country!("IT", "Italy", ["italia"]),
    country!("JM", "Jamaica"),
    country!("JO", "Jordan"),
    country!("JP", "Japan", ["nippon"]),
    country!("KE", "Kenya"),
    country!("KG", "Kyrgyzstan"),
    country!("KH", "Cambodia"),
    country!("KI", "Kiribati"),
    country!("KM", "Comoros"),
    country!("KN", "Saint Kitts and Nevis"),
    country!("KP", "North Korea", ["dprk"]),
    country!("KR", "South Korea", ["korea", "republic of korea"]),
    country!("KW", "Kuwait"),
    country!("KZ", "Kazakhstan"),
    country!("LA", "Laos", ["lao pdr"]),
    country!("LB", "Lebanon"),
    country!("LC", "Saint Lucia"),
    country!("LI", "Liechtenstein"),
    country!("LK", "Sri Lanka", ["ceylon"]),
    country!("LR", "Liberia"),
    country!("LS", "Lesotho"),
    country!("LT", "Lithuania"),
    country!("LU", "Luxembourg"),
    country!("LV", "Latvia"),
    country!("LY", "Libya"),
    country!("MA", "Morocco"),
    country!("MC", "Monaco"),
    country!("MD", "Moldova"),
    country!("ME", "Montenegro"),
    country!("MG", "Madagascar"),
    country!("MH", "Marshall Islands"),
    country!("MK", "North Macedonia", ["macedonia"]),
    country!("ML", "Mali"),
    country!("MM", "Myanmar", ["burma"]),
    country!("MN", "Mongolia"),
    country!("MP", "Northern Mariana Islands"),
    country!("MR", "Mauritania"),
    country!("MT", "Malta"),
    country!("MU", "Mauritius"),
    country!("MV", "Maldives"),
    country!("MW", "Malawi"),
    country!("MX", "Mexico"),
    country!("MY", "Malaysia"),
    country!("MZ", "Mozambique"),
    country!("NA", "Namibia"),
    country!("NC", "New Caledonia"),
    country!("NE", "Niger"),
    country!("NG", "Nigeria"),
    country!("NI", "Nicaragua"),
    country!("NL", "Netherlands", ["holland", "the netherlands", "nederland"]),
    country!("NO", "Norway", ["norge"]),
    country!("NP", "Nepal"),
    country!("NR", "Nauru"),
    country!("NU", "Niue"),
    country!("NZ", "New Zealand", ["aotearoa"]),
    country!("OM", "Oman"),
    country!("PA", "Panama"),
    country!("PE", "Peru"),
    country!("PF", "French Polynesia"),
    country!("PG", "Papua New Guinea", ["png"]),
    country!("PH", "Philippines"),
    country!("PK", "Pakistan"),
    country!("PL", "Poland", ["polska"]),
    country!("PR", "Puerto Rico"),
    country!("PS", "Palestine"),
    country!("PT", "Portugal"),
    country!("PW", "Palau"),
    country!("PY", "Paraguay"),
    country!("QA", "Qatar"),
    country!("RO", "Romania"),
    country!("RS", "Serbia"),
    country!("RU", "Russia", ["russian federation", "rossiya"]),
    country!("RW", "Rwanda"),
    country!("SA", "Saudi Arabia"),
    country!("SB", "Solomon Islands"),
    country!("SC", "Seychelles"),
    country!("SD", "Sudan"),
    country!("SE", "Sweden", ["sverige"]),
    country!("SG", "Singapore"),
    country!("SI", "Slovenia"),
    country!("SK", "Slovakia"),
    country!("SL", "Sierra Leone"),
    country!("SM", "San Marino"),
    country!("SN", "Senegal"),
    country!("SO", "Somalia"),
    country!("SR", "Suriname"),
    country!("SS", "South Sudan"),
    country!("ST", "Sao Tome and Principe"),
    country!("SV", "El Salvador"),
    country!("SY", "Syria"),
    country!("SZ", "Eswatini", ["swaziland"]),
    country!("TD", "Chad"),
    country!("TG", "Togo"),
    country!("TH", "Thailand"),
    country!("TJ", "Tajikistan"),
    country!("TL", "Timor-Leste", ["east timor"]),
    country!("TM", "Turkmenistan"),
    country!("TN", "Tunisia"),
    country!("TO", "Tonga"),
    country!("TR", "Turkey", ["turkiye"]),
    country!("TT", "Trinidad and Tobago"),
    country!("TV", "Tuvalu"),
    country!("TW", "Taiwan"),
    country!("TZ", "Tanzania"),
    country!("UA", "Ukraine"),
    country!("UG", "Uganda"),
    country!("US", "United States", ["usa", "united states of america", "the united states"]),
    country!("UY", "Uruguay"),
    country!("UZ", "Uzbekistan"),
    country!("VA", "Vatican City", ["holy see"]),
    country!("VC", "Saint Vincent and the Grenadines"),
    country!("VE", "Venezuela"),
    country!("VN", "Vietnam", ["viet nam"]),
    country!("VU", "Vanuatu"),
    country!("WS", "Samoa"),
    country!("YE", "Yemen"),
    country!("ZA", "South Africa"),
    country!("ZM", "Zambia"),
    country!("ZW", "Zimbabwe"),
];

/// Look up an entry by its alpha-2 code (case-insensitive).
pub fn by_code(code: &str) -> Option<&'static CountryEntry> {
    COUNTRIES
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(code.trim()))
}
