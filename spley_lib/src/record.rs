//! Bill records as scraped and as cleaned.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The six text fields of one result row, exactly as scraped.
///
/// An empty string stands for a missing value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Bill identifier text, embedding `NNNN/YYYY-XX`.
    #[serde(default)]
    pub proyecto: String,
    /// Presentation date text, embedding `DD/MM/YYYY`.
    #[serde(default)]
    pub fecha: String,
    #[serde(default)]
    pub titulo: String,
    #[serde(default)]
    pub estado: String,
    #[serde(default)]
    pub proponente: String,
    /// Author names joined with `", "`.
    #[serde(default)]
    pub autores: String,
}

/// A raw record plus every derived field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanRecord {
    pub raw: RawRecord,
    /// Canonical `NNNN/YYYY-XX` bill id, or the trimmed raw text when no pattern matched.
    pub proyecto_clean: Option<String>,
    /// Canonical `DD/MM/YYYY` substring.
    pub fecha_clean: Option<String>,
    /// `fecha_clean` parsed as a calendar date.
    pub fecha_date: Option<NaiveDate>,
    pub titulo_clean: String,
    pub estado_clean: String,
    pub proponente_clean: String,
    pub authors_clean: Vec<String>,
    pub political_party: PoliticalParty,
    pub project_category: ProjectCategory,
    pub region: Option<String>,
}

impl CleanRecord {
    pub fn author_count(&self) -> usize {
        self.authors_clean.len()
    }

    /// Cleaned values laid back out as a raw record, for re-validation.
    pub fn to_raw(&self) -> RawRecord {
        RawRecord {
            proyecto: self.proyecto_clean.clone().unwrap_or_default(),
            fecha: self.fecha_clean.clone().unwrap_or_default(),
            titulo: self.titulo_clean.clone(),
            estado: self.estado_clean.clone(),
            proponente: self.proponente_clean.clone(),
            autores: self.authors_clean.join(", "),
        }
    }
}

/// Political party inferred from the author list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PoliticalParty {
    #[serde(rename = "FREPAP")]
    Frepap,
    #[serde(rename = "PERU LIBRE")]
    PeruLibre,
    #[serde(rename = "FUERZA POPULAR")]
    FuerzaPopular,
    #[serde(rename = "ACCION POPULAR")]
    AccionPopular,
    #[serde(rename = "ALIANZA PARA EL PROGRESO")]
    AlianzaParaElProgreso,
    #[serde(rename = "PODEMOS PERU")]
    PodemosPeru,
    #[serde(rename = "AVANZA PAIS")]
    AvanzaPais,
    #[serde(rename = "RENOVACION POPULAR")]
    RenovacionPopular,
    #[serde(rename = "SOMOS PERU")]
    SomosPeru,
    #[serde(rename = "UNION POR EL PERU")]
    UnionPorElPeru,
    #[serde(rename = "PARTIDO MORADO")]
    PartidoMorado,
    #[serde(rename = "JUNTOS POR EL PERU")]
    JuntosPorElPeru,
    #[serde(rename = "FRENTE AMPLIO")]
    FrenteAmplio,
    #[serde(rename = "CONFIEP")]
    Confiep,
    #[serde(rename = "INDEPENDIENTE")]
    Independiente,
    /// No known party found in the author text.
    #[serde(rename = "DESCONOCIDO")]
    Desconocido,
}

impl PoliticalParty {
    pub const ALL: [PoliticalParty; 16] = [
        PoliticalParty::Frepap,
        PoliticalParty::PeruLibre,
        PoliticalParty::FuerzaPopular,
        PoliticalParty::AccionPopular,
        PoliticalParty::AlianzaParaElProgreso,
        PoliticalParty::PodemosPeru,
        PoliticalParty::AvanzaPais,
        PoliticalParty::RenovacionPopular,
        PoliticalParty::SomosPeru,
        PoliticalParty::UnionPorElPeru,
        PoliticalParty::PartidoMorado,
        PoliticalParty::JuntosPorElPeru,
        PoliticalParty::FrenteAmplio,
        PoliticalParty::Confiep,
        PoliticalParty::Independiente,
        PoliticalParty::Desconocido,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PoliticalParty::Frepap => "FREPAP",
            PoliticalParty::PeruLibre => "PERU LIBRE",
            PoliticalParty::FuerzaPopular => "FUERZA POPULAR",
            PoliticalParty::AccionPopular => "ACCION POPULAR",
            PoliticalParty::AlianzaParaElProgreso => "ALIANZA PARA EL PROGRESO",
            PoliticalParty::PodemosPeru => "PODEMOS PERU",
            PoliticalParty::AvanzaPais => "AVANZA PAIS",
            PoliticalParty::RenovacionPopular => "RENOVACION POPULAR",
            PoliticalParty::SomosPeru => "SOMOS PERU",
            PoliticalParty::UnionPorElPeru => "UNION POR EL PERU",
            PoliticalParty::PartidoMorado => "PARTIDO MORADO",
            PoliticalParty::JuntosPorElPeru => "JUNTOS POR EL PERU",
            PoliticalParty::FrenteAmplio => "FRENTE AMPLIO",
            PoliticalParty::Confiep => "CONFIEP",
            PoliticalParty::Independiente => "INDEPENDIENTE",
            PoliticalParty::Desconocido => "DESCONOCIDO",
        }
    }
}

impl fmt::Display for PoliticalParty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PoliticalParty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        PoliticalParty::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| format!("unknown party '{}'", s))
    }
}

/// Subject-matter category inferred from the title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectCategory {
    Educacion,
    Salud,
    Trabajo,
    Economia,
    Infraestructura,
    Cultura,
    Ambiente,
    Seguridad,
    Social,
    Administrativo,
    /// No keyword matched.
    Otros,
}

impl ProjectCategory {
    pub const ALL: [ProjectCategory; 11] = [
        ProjectCategory::Educacion,
        ProjectCategory::Salud,
        ProjectCategory::Trabajo,
        ProjectCategory::Economia,
        ProjectCategory::Infraestructura,
        ProjectCategory::Cultura,
        ProjectCategory::Ambiente,
        ProjectCategory::Seguridad,
        ProjectCategory::Social,
        ProjectCategory::Administrativo,
        ProjectCategory::Otros,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectCategory::Educacion => "EDUCACION",
            ProjectCategory::Salud => "SALUD",
            ProjectCategory::Trabajo => "TRABAJO",
            ProjectCategory::Economia => "ECONOMIA",
            ProjectCategory::Infraestructura => "INFRAESTRUCTURA",
            ProjectCategory::Cultura => "CULTURA",
            ProjectCategory::Ambiente => "AMBIENTE",
            ProjectCategory::Seguridad => "SEGURIDAD",
            ProjectCategory::Social => "SOCIAL",
            ProjectCategory::Administrativo => "ADMINISTRATIVO",
            ProjectCategory::Otros => "OTROS",
        }
    }
}

impl fmt::Display for ProjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProjectCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        ProjectCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}
