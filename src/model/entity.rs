//! Named entities: classes, properties, individuals.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const OWL_THING: &str = "http://www.w3.org/2002/07/owl#Thing";
pub const OWL_NOTHING: &str = "http://www.w3.org/2002/07/owl#Nothing";
pub const OWL_TOP_OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#topObjectProperty";
pub const OWL_BOTTOM_OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#bottomObjectProperty";
pub const OWL_TOP_DATA_PROPERTY: &str = "http://www.w3.org/2002/07/owl#topDataProperty";
pub const OWL_BOTTOM_DATA_PROPERTY: &str = "http://www.w3.org/2002/07/owl#bottomDataProperty";

/// Shared, immutable IRI. Cloning is a refcount bump.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Iri(Arc<str>);

impl Iri {
    /// Create an IRI. Fails on an empty string.
    pub fn new(iri: impl AsRef<str>) -> Result<Self> {
        let iri = iri.as_ref();
        if iri.trim().is_empty() {
            return Err(Error::InvalidArgument("IRI must not be empty".into()));
        }
        Ok(Self(Arc::from(iri)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The fragment or last path segment, for log output.
    pub fn short_form(&self) -> &str {
        self.0
            .rsplit(['#', '/'])
            .find(|s| !s.is_empty())
            .unwrap_or(&self.0)
    }

    fn built_in(iri: &'static str) -> Self {
        Self(Arc::from(iri))
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// What an entity denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Class,
    ObjectProperty,
    DataProperty,
    AnnotationProperty,
    NamedIndividual,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Class => "Class",
            EntityKind::ObjectProperty => "ObjectProperty",
            EntityKind::DataProperty => "DataProperty",
            EntityKind::AnnotationProperty => "AnnotationProperty",
            EntityKind::NamedIndividual => "NamedIndividual",
        };
        f.write_str(name)
    }
}

/// A named entity. Equality is structural over `(kind, iri)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    kind: EntityKind,
    iri: Iri,
}

impl Entity {
    pub fn new(kind: EntityKind, iri: Iri) -> Self {
        Self { kind, iri }
    }

    pub fn class(iri: impl AsRef<str>) -> Result<Self> {
        Ok(Self::new(EntityKind::Class, Iri::new(iri)?))
    }

    pub fn object_property(iri: impl AsRef<str>) -> Result<Self> {
        Ok(Self::new(EntityKind::ObjectProperty, Iri::new(iri)?))
    }

    pub fn data_property(iri: impl AsRef<str>) -> Result<Self> {
        Ok(Self::new(EntityKind::DataProperty, Iri::new(iri)?))
    }

    pub fn annotation_property(iri: impl AsRef<str>) -> Result<Self> {
        Ok(Self::new(EntityKind::AnnotationProperty, Iri::new(iri)?))
    }

    pub fn named_individual(iri: impl AsRef<str>) -> Result<Self> {
        Ok(Self::new(EntityKind::NamedIndividual, Iri::new(iri)?))
    }

    /// owl:Thing, the root of every class hierarchy.
    pub fn thing() -> Self {
        Self::new(EntityKind::Class, Iri::built_in(OWL_THING))
    }

    pub fn nothing() -> Self {
        Self::new(EntityKind::Class, Iri::built_in(OWL_NOTHING))
    }

    pub fn top_object_property() -> Self {
        Self::new(EntityKind::ObjectProperty, Iri::built_in(OWL_TOP_OBJECT_PROPERTY))
    }

    pub fn bottom_object_property() -> Self {
        Self::new(EntityKind::ObjectProperty, Iri::built_in(OWL_BOTTOM_OBJECT_PROPERTY))
    }

    pub fn top_data_property() -> Self {
        Self::new(EntityKind::DataProperty, Iri::built_in(OWL_TOP_DATA_PROPERTY))
    }

    pub fn bottom_data_property() -> Self {
        Self::new(EntityKind::DataProperty, Iri::built_in(OWL_BOTTOM_DATA_PROPERTY))
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn iri(&self) -> &Iri {
        &self.iri
    }

    pub fn is_built_in(&self) -> bool {
        matches!(
            self.iri.as_str(),
            OWL_THING
                | OWL_NOTHING
                | OWL_TOP_OBJECT_PROPERTY
                | OWL_BOTTOM_OBJECT_PROPERTY
                | OWL_TOP_DATA_PROPERTY
                | OWL_BOTTOM_DATA_PROPERTY
        )
    }

    /// Fail with [`Error::KindMismatch`] unless this entity is of `expected` kind.
    pub fn expect_kind(&self, expected: EntityKind) -> Result<()> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(Error::KindMismatch { expected, got: self.kind, iri: self.iri.as_str().to_string() })
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.iri.short_form())
    }
}
