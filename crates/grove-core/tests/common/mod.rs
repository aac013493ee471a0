//! Shared fixtures for grove-core integration tests

#![allow(dead_code)]

use std::sync::{Arc, Once};

use grove_core::grove_decl::{
    AttributeDefinition, AttributeDefinitionList, AttributeList, AttributeValue, ContentType,
    DeclaredValue, DefaultValue, Dtd, ElementType, Entity, EntityKind, ExternalId, Location,
    Notation, Origin,
};
use grove_core::{ElementStart, EndProlog, GroveBuilder, GroveConfig};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Route `tracing` output to the test harness; `RUST_LOG` selects levels
pub fn try_init() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Source positions within one document entity
pub struct Source {
    origin: Arc<Origin>,
}

impl Source {
    pub fn new(system_id: &str) -> Self {
        Self {
            origin: Origin::document(system_id),
        }
    }

    pub fn at(&self, index: u32) -> Location {
        Location::new(Arc::clone(&self.origin), index)
    }

    pub fn origin(&self) -> &Arc<Origin> {
        &self.origin
    }
}

/// Declarations of a small report document type
///
/// ```text
/// <!ELEMENT REPORT - - (TITLE, SECT+)>
/// <!ATTLIST REPORT STATUS (DRAFT|FINAL) DRAFT  AUTHOR CDATA #IMPLIED  LOGO ENTITY #IMPLIED>
/// <!ELEMENT SECT - - (#PCDATA)>
/// <!ATTLIST SECT ID ID #IMPLIED  REFS IDREFS #IMPLIED  FORMAT NOTATION (TEX|EQN) #IMPLIED>
/// <!ELEMENT TITLE - - (#PCDATA)>
/// <!ENTITY amp "&">  <!ENTITY logo SYSTEM "logo.tex" NDATA TEX>  <!ENTITY mdash SDATA "[mdash]">
/// <!NOTATION TEX PUBLIC "-//TeX//NOTATION TeX//EN">  <!NOTATION EQN SYSTEM>
/// ```
pub struct Fixture {
    pub dtd: Arc<Dtd>,
    pub report: Arc<ElementType>,
    pub sect: Arc<ElementType>,
    pub title: Arc<ElementType>,
    pub report_defs: Arc<AttributeDefinitionList>,
    pub sect_defs: Arc<AttributeDefinitionList>,
    pub logo: Arc<Entity>,
    pub amp: Arc<Entity>,
    pub mdash: Arc<Entity>,
}

impl Fixture {
    pub fn new() -> Self {
        let mut report_defs = AttributeDefinitionList::new();
        report_defs
            .define(AttributeDefinition::new(
                "STATUS",
                DeclaredValue::NameTokenGroup(vec!["DRAFT".into(), "FINAL".into()]),
                DefaultValue::Default(AttributeValue::tokens("DRAFT")),
            ))
            .unwrap();
        report_defs
            .define(AttributeDefinition::new("AUTHOR", DeclaredValue::Cdata, DefaultValue::Implied))
            .unwrap();
        report_defs
            .define(AttributeDefinition::new("LOGO", DeclaredValue::Entity, DefaultValue::Implied))
            .unwrap();
        let report_defs = Arc::new(report_defs);

        let mut sect_defs = AttributeDefinitionList::new();
        sect_defs
            .define(AttributeDefinition::new("ID", DeclaredValue::Id, DefaultValue::Implied))
            .unwrap();
        sect_defs
            .define(AttributeDefinition::new("REFS", DeclaredValue::Idrefs, DefaultValue::Implied))
            .unwrap();
        sect_defs
            .define(AttributeDefinition::new(
                "FORMAT",
                DeclaredValue::Notation(vec!["TEX".into(), "EQN".into()]),
                DefaultValue::Implied,
            ))
            .unwrap();
        let sect_defs = Arc::new(sect_defs);

        let mut dtd = Dtd::new("REPORT");
        let report = dtd
            .add_element_type(
                ElementType::new("REPORT", ContentType::Element).with_attribute_defs(Arc::clone(&report_defs)),
            )
            .unwrap();
        let sect = dtd
            .add_element_type(
                ElementType::new("SECT", ContentType::Mixed).with_attribute_defs(Arc::clone(&sect_defs)),
            )
            .unwrap();
        let title = dtd
            .add_element_type(ElementType::new("TITLE", ContentType::Mixed))
            .unwrap();

        let amp = Entity::internal("amp", EntityKind::Text, "&");
        let logo = Entity::external(
            "logo",
            EntityKind::Ndata,
            ExternalId::system("logo.tex").with_generated("/srv/doc/logo.tex"),
            Some("TEX"),
        );
        let mdash = Entity::internal("mdash", EntityKind::Sdata, "[mdash]");
        dtd.add_entity(Arc::clone(&amp)).unwrap();
        dtd.add_entity(Arc::clone(&logo)).unwrap();
        dtd.add_entity(Arc::clone(&mdash)).unwrap();
        dtd.add_notation(Notation::new("TEX", Some(ExternalId::public("-//TeX//NOTATION TeX//EN", None))))
            .unwrap();
        dtd.add_notation(Notation::new("EQN", None)).unwrap();

        Self {
            dtd: Arc::new(dtd),
            report,
            sect,
            title,
            report_defs,
            sect_defs,
            logo,
            amp,
            mdash,
        }
    }

    pub fn builder(&self, config: GroveConfig) -> GroveBuilder {
        let mut builder = GroveBuilder::new(config);
        builder.end_prolog(EndProlog::new(Arc::clone(&self.dtd))).unwrap();
        builder
    }

    pub fn sect_attributes(&self, id: Option<&str>, refs: Option<&str>) -> AttributeList {
        let mut attributes = AttributeList::new(Arc::clone(&self.sect_defs));
        if let Some(id) = id {
            attributes.set_named("ID", AttributeValue::tokens(id)).unwrap();
        }
        if let Some(refs) = refs {
            attributes.set_named("REFS", AttributeValue::tokens(refs)).unwrap();
        }
        attributes
    }

    pub fn start(&self, element_type: &Arc<ElementType>, location: Location) -> ElementStart {
        ElementStart::new(Arc::clone(element_type), location)
    }
}
