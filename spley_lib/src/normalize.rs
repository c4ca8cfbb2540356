//! Field normalization: messy scraped text to canonical values.
//!
//! Every function here is pure and total. Missing input is the empty string;
//! nullable results come back as `None`, everything else as an empty value.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::record::{CleanRecord, PoliticalParty, ProjectCategory, RawRecord};

/// Date format used on the portal and in every export.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{2}/\d{2}/\d{4}").unwrap());
static BILL_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+/\d{4}-[A-Za-z]+").unwrap());
static UPPER_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-ZÁÉÍÓÚÜÑ ]+").unwrap());
static VER_MAS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*ver\s+m[aá]s\s*(?:\.+|…)?\s*$").unwrap());
static TRAILING_ELLIPSIS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(?:\.{3,}|…)+\s*$").unwrap());

/// Known parties with every spelling seen on the portal, canonical name first.
const PARTY_VARIANTS: &[(PoliticalParty, &[&str])] = &[
    (
        PoliticalParty::Frepap,
        &[
            "FREPAP",
            "FRENTE POPULAR AGRÍCOLA DEL PERÚ",
            "FRENTE POPULAR AGRICOLA DEL PERU",
        ],
    ),
    (
        PoliticalParty::PeruLibre,
        &["PERU LIBRE", "PERÚ LIBRE", "PERÚ LIBRE - PARTIDO NACIONALISTA"],
    ),
    (PoliticalParty::FuerzaPopular, &["FUERZA POPULAR", "FP"]),
    (
        PoliticalParty::AccionPopular,
        &["ACCION POPULAR", "ACCIÓN POPULAR", "AP"],
    ),
    (
        PoliticalParty::AlianzaParaElProgreso,
        &["ALIANZA PARA EL PROGRESO", "APP"],
    ),
    (
        PoliticalParty::PodemosPeru,
        &["PODEMOS PERU", "PODEMOS PERÚ", "PODEMOS"],
    ),
    (
        PoliticalParty::AvanzaPais,
        &["AVANZA PAIS", "AVANZA PAÍS", "AVANZA"],
    ),
    (
        PoliticalParty::RenovacionPopular,
        &["RENOVACION POPULAR", "RENOVACIÓN POPULAR", "RP"],
    ),
    (
        PoliticalParty::SomosPeru,
        &["SOMOS PERU", "SOMOS PERÚ", "SOMOS"],
    ),
    (
        PoliticalParty::UnionPorElPeru,
        &["UNION POR EL PERU", "UNIÓN POR EL PERÚ", "UPP"],
    ),
    (PoliticalParty::PartidoMorado, &["PARTIDO MORADO", "MORADO"]),
    (
        PoliticalParty::JuntosPorElPeru,
        &["JUNTOS POR EL PERU", "JUNTOS POR EL PERÚ", "JPP"],
    ),
    (PoliticalParty::FrenteAmplio, &["FRENTE AMPLIO", "FA"]),
    (
        PoliticalParty::Confiep,
        &[
            "CONFIEP",
            "CONFEDERACIÓN NACIONAL DE INSTITUCIONES EMPRESARIALES PRIVADAS",
            "CONFEDERACION NACIONAL DE INSTITUCIONES EMPRESARIALES PRIVADAS",
        ],
    ),
    (
        PoliticalParty::Independiente,
        &["INDEPENDIENTE", "INDEPENDIENTES"],
    ),
];

/// Category keywords, matched as substrings of the uppercased title.
/// Declaration order is the tie-break.
const CATEGORY_KEYWORDS: &[(ProjectCategory, &[&str])] = &[
    (
        ProjectCategory::Educacion,
        &[
            "EDUCACIÓN",
            "EDUCACION",
            "EDUCATIVO",
            "EDUCATIVA",
            "UNIVERSIDAD",
            "INSTITUTO",
            "COLEGIO",
            "ESCUELA",
            "ESTUDIANTE",
        ],
    ),
    (
        ProjectCategory::Salud,
        &[
            "SALUD",
            "MÉDICO",
            "MEDICO",
            "HOSPITAL",
            "MEDICINA",
            "ENFERMO",
            "PACIENTE",
            "SANITARIO",
        ],
    ),
    (
        ProjectCategory::Trabajo,
        &[
            "TRABAJO",
            "TRABAJADOR",
            "EMPLEO",
            "LABORAL",
            "SALARIO",
            "SUELDO",
            "RÉGIMEN LABORAL",
        ],
    ),
    (
        ProjectCategory::Economia,
        &[
            "ECONÓMICO",
            "ECONOMICO",
            "ECONOMÍA",
            "ECONOMIA",
            "FINANCIERO",
            "PRESUPUESTO",
            "INVERSIÓN",
            "INVERSION",
            "DESARROLLO ECONÓMICO",
        ],
    ),
    (
        ProjectCategory::Infraestructura,
        &[
            "CARRETERA",
            "PUENTE",
            "CONSTRUCCIÓN",
            "CONSTRUCCION",
            "OBRA",
            "INFRAESTRUCTURA",
            "RUTA",
        ],
    ),
    (
        ProjectCategory::Cultura,
        &[
            "CULTURAL",
            "PATRIMONIO",
            "CULTURA",
            "TRADICIÓN",
            "TRADICION",
            "FESTIVIDAD",
            "ARTE",
        ],
    ),
    (
        ProjectCategory::Ambiente,
        &[
            "AMBIENTAL",
            "MEDIO AMBIENTE",
            "CONTAMINACIÓN",
            "CONTAMINACION",
            "ECOLOGÍA",
            "ECOLOGIA",
            "NATURALEZA",
        ],
    ),
    (
        ProjectCategory::Seguridad,
        &[
            "SEGURIDAD",
            "POLICÍA",
            "POLICIA",
            "DEFENSA",
            "CRIMEN",
            "DELITO",
            "JUSTICIA",
        ],
    ),
    (
        ProjectCategory::Social,
        &[
            "SOCIAL",
            "POBREZA",
            "VULNERABLE",
            "DISCAPACIDAD",
            "ADULTO MAYOR",
            "NIÑO",
        ],
    ),
    (
        ProjectCategory::Administrativo,
        &[
            "ADMINISTRATIVO",
            "FUNCIONARIO",
            "SERVIDOR PÚBLICO",
            "SERVIDOR PUBLICO",
            "RÉGIMEN",
            "REGIMEN",
            "NOMBRAMIENTO",
        ],
    ),
];

/// Peru's regions, matched as substrings of the uppercased title in this order.
pub const REGIONS: &[&str] = &[
    "LIMA",
    "AREQUIPA",
    "CUSCO",
    "LA LIBERTAD",
    "PIURA",
    "JUNÍN",
    "CAJAMARCA",
    "LAMBAYEQUE",
    "ANCASH",
    "PUNO",
    "HUÁNUCO",
    "ICA",
    "LORETO",
    "SAN MARTÍN",
    "TACNA",
    "UCAYALI",
    "AYACUCHO",
    "MOQUEGUA",
    "PASCO",
    "TUMBES",
    "HUANCAVELICA",
    "APURÍMAC",
    "MADRE DE DIOS",
    "CALLAO",
];

/// First `DD/MM/YYYY` substring, or the whole trimmed text reformatted if it
/// parses as such a date.
pub fn clean_date(raw: &str) -> Option<String> {
    if let Some(m) = DATE_RE.find(raw) {
        return Some(m.as_str().to_string());
    }
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .ok()
        .map(|d| d.format(DATE_FORMAT).to_string())
}

/// Calendar date of a canonical `DD/MM/YYYY` string.
pub fn parse_date(clean: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(clean, DATE_FORMAT).ok()
}

/// First `<digits>/<yyyy>-<letters>` substring, else the trimmed text.
pub fn clean_bill_id(raw: &str) -> Option<String> {
    if let Some(m) = BILL_ID_RE.find(raw) {
        return Some(m.as_str().to_string());
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Keeps letters, digits, spaces and `.,;:()-`, collapsing whitespace.
pub fn clean_title(raw: &str) -> String {
    let filtered: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || ".,;:()-".contains(*c))
        .collect();
    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Uppercased status with any leading label stripped.
pub fn clean_state(raw: &str) -> String {
    strip_to_upper_token(raw)
}

/// Uppercased sponsor with any leading label stripped.
pub fn clean_proponent(raw: &str) -> String {
    strip_to_upper_token(raw)
}

// The value is the longest all-caps run; labels such as "Estado:" are mixed case.
fn strip_to_upper_token(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let mut best: Option<&str> = None;
    for m in UPPER_RUN_RE.find_iter(trimmed) {
        let run = m.as_str().trim();
        if run.chars().count() < 3 {
            continue;
        }
        if best.map_or(true, |b| run.chars().count() > b.chars().count()) {
            best = Some(run);
        }
    }
    match best {
        Some(run) => run.split_whitespace().collect::<Vec<_>>().join(" "),
        None => trimmed.to_uppercase(),
    }
}

/// Splits a comma-joined author list, dropping "ver más..." tails and empties.
pub fn split_authors(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|piece| {
            let piece = VER_MAS_RE.replace(piece.trim(), "");
            let piece = TRAILING_ELLIPSIS_RE.replace(&piece, "");
            let piece = piece.trim();
            if piece.is_empty() {
                None
            } else {
                Some(piece.to_string())
            }
        })
        .collect()
}

/// First party, in declaration order, with a variant anywhere in the
/// uppercased author text. Short acronyms match inside names too.
pub fn classify_party(authors_text: &str) -> PoliticalParty {
    let text = authors_text.trim().to_uppercase();
    if text.is_empty() {
        return PoliticalParty::Desconocido;
    }
    for (party, variants) in PARTY_VARIANTS {
        if variants.iter().any(|v| text.contains(&v.to_uppercase())) {
            return *party;
        }
    }
    if text.contains("INDEPENDIENTE") {
        PoliticalParty::Independiente
    } else {
        PoliticalParty::Desconocido
    }
}

/// First category with a keyword in the title.
pub fn classify_category(title_text: &str) -> ProjectCategory {
    let text = title_text.to_uppercase();
    if text.trim().is_empty() {
        return ProjectCategory::Otros;
    }
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(ProjectCategory::Otros)
}

/// First region named in the title.
pub fn extract_region(title_text: &str) -> Option<&'static str> {
    let text = title_text.to_uppercase();
    REGIONS.iter().copied().find(|r| text.contains(r))
}

/// Applies every normalizer to one record. No validation happens here.
pub fn normalize_record(raw: &RawRecord) -> CleanRecord {
    let fecha_clean = clean_date(&raw.fecha);
    let fecha_date = fecha_clean.as_deref().and_then(parse_date);
    let titulo_clean = clean_title(&raw.titulo);
    let authors_clean = split_authors(&raw.autores);
    let political_party = classify_party(&authors_clean.join(", "));

    CleanRecord {
        proyecto_clean: clean_bill_id(&raw.proyecto),
        fecha_clean,
        fecha_date,
        estado_clean: clean_state(&raw.estado),
        proponente_clean: clean_proponent(&raw.proponente),
        project_category: classify_category(&titulo_clean),
        region: extract_region(&titulo_clean).map(str::to_string),
        titulo_clean,
        authors_clean,
        political_party,
        raw: raw.clone(),
    }
}

pub fn normalize_batch(records: &[RawRecord]) -> Vec<CleanRecord> {
    records.iter().map(normalize_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_extracted_from_noise() {
        assert_eq!(
            clean_date("Fecha de Presentación15/06/2024").as_deref(),
            Some("15/06/2024")
        );
        assert_eq!(clean_date("  01/02/2023 ").as_deref(), Some("01/02/2023"));
    }

    #[test]
    fn date_first_match_wins() {
        assert_eq!(
            clean_date("del 01/01/2024 al 31/12/2024").as_deref(),
            Some("01/01/2024")
        );
    }

    #[test]
    fn date_pattern_does_not_check_calendar() {
        assert_eq!(clean_date("32/13/2024").as_deref(), Some("32/13/2024"));
    }

    #[test]
    fn date_without_pattern_is_none() {
        assert_eq!(clean_date("sin fecha"), None);
        assert_eq!(clean_date(""), None);
        assert_eq!(clean_date("2024-06-15"), None);
    }

    #[test]
    fn date_single_digit_parts_reformatted() {
        assert_eq!(clean_date("5/6/2024").as_deref(), Some("05/06/2024"));
    }

    #[test]
    fn bill_id_extracted() {
        assert_eq!(
            clean_bill_id("Proyecto de Ley 11408/2024-CR").as_deref(),
            Some("11408/2024-CR")
        );
        assert_eq!(
            clean_bill_id("11408/2024-CR").as_deref(),
            Some("11408/2024-CR")
        );
    }

    #[test]
    fn bill_id_falls_back_to_trimmed_raw() {
        assert_eq!(clean_bill_id("  PL sin numero ").as_deref(), Some("PL sin numero"));
        assert_eq!(clean_bill_id("   "), None);
        assert_eq!(clean_bill_id(""), None);
    }

    #[test]
    fn title_whitespace_collapsed() {
        assert_eq!(clean_title("  Ley   de   Reforma  "), "Ley de Reforma");
        assert_eq!(clean_title("Ley\n\tde\u{a0}Salud"), "Ley de Salud");
    }

    #[test]
    fn title_strips_disallowed_characters() {
        assert_eq!(
            clean_title("Ley N° 123: «Niñez» (modifica) - art. 5; ¿ok?"),
            "Ley N 123: Niñez (modifica) - art. 5; ok"
        );
        assert_eq!(clean_title(""), "");
    }

    #[test]
    fn state_strips_label() {
        assert_eq!(clean_state("Estado: EN COMISIÓN"), "EN COMISIÓN");
        assert_eq!(clean_state("  aprobado "), "APROBADO");
        assert_eq!(clean_state("APROBADO"), "APROBADO");
        assert_eq!(clean_state(""), "");
    }

    #[test]
    fn proponent_strips_label() {
        assert_eq!(clean_proponent("Proponente: CONGRESO"), "CONGRESO");
        assert_eq!(clean_proponent("Poder Ejecutivo"), "PODER EJECUTIVO");
    }

    #[test]
    fn authors_split_and_trimmed() {
        assert_eq!(
            split_authors(" Ana Soto , Luis Paz,, "),
            vec!["Ana Soto", "Luis Paz"]
        );
        assert!(split_authors("").is_empty());
    }

    #[test]
    fn authors_drop_ver_mas_tail() {
        assert_eq!(
            split_authors("Ana Soto, Luis Paz ver más..."),
            vec!["Ana Soto", "Luis Paz"]
        );
        assert_eq!(split_authors("Ana Soto, Ver Mas"), vec!["Ana Soto"]);
        assert_eq!(split_authors("Ana Soto…"), vec!["Ana Soto"]);
        assert_eq!(split_authors("Ana Soto..."), vec!["Ana Soto"]);
    }

    #[test]
    fn party_from_canonical_name() {
        assert_eq!(
            classify_party("Juan Pérez - PERU LIBRE"),
            PoliticalParty::PeruLibre
        );
        assert_eq!(
            classify_party("Juan Pérez - Partido Desconocido"),
            PoliticalParty::Desconocido
        );
    }

    #[test]
    fn party_from_variant() {
        assert_eq!(
            classify_party("María Ruiz (Perú Libre - Partido Nacionalista)"),
            PoliticalParty::PeruLibre
        );
        assert_eq!(
            classify_party("Rosa Díaz - Alianza para el Progreso"),
            PoliticalParty::AlianzaParaElProgreso
        );
        assert_eq!(
            classify_party("Frente Popular Agrícola del Perú"),
            PoliticalParty::Frepap
        );
    }

    #[test]
    fn party_acronym_matches_inside_words() {
        assert_eq!(
            classify_party("Congresista Apaza Ordóñez"),
            PoliticalParty::AccionPopular
        );
        // "AP" is declared before "APP".
        assert_eq!(classify_party("Rosa Díaz - APP"), PoliticalParty::AccionPopular);
    }

    #[test]
    fn party_declaration_order_wins() {
        assert_eq!(
            classify_party("Fuerza Popular, Acción Popular"),
            PoliticalParty::FuerzaPopular
        );
    }

    #[test]
    fn party_independiente_fallback() {
        assert_eq!(
            classify_party("Congresistas independientes"),
            PoliticalParty::Independiente
        );
        assert_eq!(classify_party(""), PoliticalParty::Desconocido);
    }

    #[test]
    fn category_examples() {
        assert_eq!(
            classify_category("Ley de Reforma Educativa"),
            ProjectCategory::Educacion
        );
        assert_eq!(
            classify_category("Ley de Salud Pública"),
            ProjectCategory::Salud
        );
        assert_eq!(classify_category("Ley Misteriosa"), ProjectCategory::Otros);
        assert_eq!(classify_category(""), ProjectCategory::Otros);
    }

    #[test]
    fn category_declaration_order_breaks_ties() {
        // Mentions both a school and a hospital; EDUCACION is declared first.
        assert_eq!(
            classify_category("Construcción de escuela y hospital"),
            ProjectCategory::Educacion
        );
    }

    #[test]
    fn region_first_in_list_order() {
        assert_eq!(
            extract_region("Declara de interés la carretera Cusco - Lima"),
            Some("LIMA")
        );
        assert_eq!(extract_region("Puente en Tumbes"), Some("TUMBES"));
        assert_eq!(extract_region("Ley general"), None);
        assert_eq!(extract_region(""), None);
    }

    #[test]
    fn normalize_record_fills_every_field() {
        let raw = RawRecord {
            proyecto: "Proyecto de Ley 12345/2024-CR".into(),
            fecha: "Fecha de Presentación15/06/2024".into(),
            titulo: "  Ley de Reforma   Educativa en Puno ".into(),
            estado: "Estado: APROBADO".into(),
            proponente: "CONGRESO".into(),
            autores: "Juan Pérez - PERU LIBRE, Ana Soto ver más...".into(),
        };
        let clean = normalize_record(&raw);
        assert_eq!(clean.proyecto_clean.as_deref(), Some("12345/2024-CR"));
        assert_eq!(clean.fecha_clean.as_deref(), Some("15/06/2024"));
        assert_eq!(clean.fecha_date, NaiveDate::from_ymd_opt(2024, 6, 15));
        assert_eq!(clean.titulo_clean, "Ley de Reforma Educativa en Puno");
        assert_eq!(clean.estado_clean, "APROBADO");
        assert_eq!(clean.authors_clean, vec!["Juan Pérez - PERU LIBRE", "Ana Soto"]);
        assert_eq!(clean.political_party, PoliticalParty::PeruLibre);
        assert_eq!(clean.project_category, ProjectCategory::Educacion);
        assert_eq!(clean.region.as_deref(), Some("PUNO"));
        assert_eq!(clean.raw, raw);
    }

    #[test]
    fn normalize_empty_record_is_total() {
        let clean = normalize_record(&RawRecord::default());
        assert_eq!(clean.proyecto_clean, None);
        assert_eq!(clean.fecha_clean, None);
        assert_eq!(clean.fecha_date, None);
        assert_eq!(clean.titulo_clean, "");
        assert!(clean.authors_clean.is_empty());
        assert_eq!(clean.political_party, PoliticalParty::Desconocido);
        assert_eq!(clean.project_category, ProjectCategory::Otros);
        assert_eq!(clean.region, None);
    }
}
