//! Readers walking a grove while it is being built

mod common;

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use grove_core::grove_decl::{ContentType, ElementType, Location};
use grove_core::{
    AccessError, BuildError, ElementStart, Event, GroveBuilder, GroveConfig, PulsePolicy, WaitPolicy,
};

use common::try_init;

fn element(name: &str) -> Arc<ElementType> {
    Arc::new(ElementType::new(name, ContentType::Mixed))
}

fn start(name: &str) -> ElementStart {
    ElementStart::new(element(name), Location::unknown(0))
}

#[test]
fn test_reader_waits_for_producer() -> anyhow::Result<()> {
    try_init();
    let config = GroveConfig::new().with_pulse_policy(PulsePolicy::EVERY_EVENT);
    let mut builder = GroveBuilder::new(config);
    let root = builder.root();

    let (sender, receiver) = mpsc::channel();
    let reader = thread::spawn(move || {
        let first = root.document_element().and_then(|doc| doc.first_child());
        let _ = sender.send(first.and_then(|node| node.char()));
    });

    thread::sleep(Duration::from_millis(20));
    builder.start_element(start("DOC"))?;
    builder.data("ab", &Location::unknown(5))?;
    builder.end_element()?;

    // Answered before the document ends
    let answer = receiver.recv_timeout(Duration::from_secs(10))?;
    assert_eq!(answer, Ok('a'));
    assert!(!builder.is_complete());

    builder.end_document()?;
    reader.join().expect("reader panicked");
    Ok(())
}

#[test]
fn test_poll_reports_blocked_until_known() -> anyhow::Result<()> {
    let config = GroveConfig::new().with_wait_policy(WaitPolicy::Poll);
    let mut builder = GroveBuilder::new(config);
    let root = builder.root();

    assert_eq!(root.document_element(), Err(AccessError::Blocked));
    assert_eq!(root.prolog().err(), Some(AccessError::Blocked));
    assert_eq!(root.messages().err(), Some(AccessError::Blocked));

    builder.start_element(start("DOC"))?;
    builder.data("ab", &Location::unknown(5))?;
    let doc = root.document_element()?;
    assert!(root.prolog()?.is_empty());

    // Buffered characters are not visible until the run is stored
    assert_eq!(doc.first_child(), Err(AccessError::Blocked));
    assert_eq!(doc.next_sibling(), Err(AccessError::Blocked));
    assert!(doc.maybe_more_siblings()?);

    builder.end_element()?;
    let a = doc.first_child()?;
    assert_eq!(a.char()?, 'a');
    assert_eq!(a.next_sibling()?.char()?, 'b');
    assert_eq!(doc.next_sibling(), Err(AccessError::Blocked));
    assert_eq!(root.epilog().err(), Some(AccessError::Blocked));
    assert_eq!(root.entities()?.node_list().err(), Some(AccessError::Blocked));
    assert_eq!(root.elements()?.named_node("X"), Err(AccessError::Blocked));

    builder.end_document()?;
    assert_eq!(doc.next_sibling(), Err(AccessError::Absent));
    assert!(!doc.maybe_more_siblings()?);
    assert!(root.epilog()?.is_empty());
    assert_eq!(root.entities()?.node_list()?.len()?, 0);
    assert_eq!(root.elements()?.named_node("X"), Err(AccessError::Absent));
    Ok(())
}

#[test]
fn test_treat_as_absent_never_blocks() -> anyhow::Result<()> {
    let config = GroveConfig::new().with_wait_policy(WaitPolicy::TreatAsAbsent);
    let mut builder = GroveBuilder::new(config);
    let root = builder.root();

    assert_eq!(root.document_element(), Err(AccessError::Absent));

    builder.start_element(start("DOC"))?;
    builder.end_element()?;
    let doc = root.document_element()?;
    assert_eq!(doc.next_sibling(), Err(AccessError::Absent));
    assert_eq!(doc.gi()?, "DOC");

    builder.start_element(start("STRAY"))?;
    assert_eq!(doc.next_sibling()?.gi()?, "STRAY");
    Ok(())
}

#[test]
fn test_bounded_wait_times_out() -> anyhow::Result<()> {
    let config = GroveConfig::new().with_wait_policy(WaitPolicy::Block(Some(Duration::from_millis(20))));
    let mut builder = GroveBuilder::new(config);
    builder.start_element(start("DOC"))?;

    let doc = builder.root().document_element()?;
    assert_eq!(doc.first_child(), Err(AccessError::Blocked));
    Ok(())
}

#[test]
fn test_completion_is_monotonic() -> anyhow::Result<()> {
    let mut builder = GroveBuilder::default();
    let grove = builder.grove();
    let before = grove.generation();

    builder.handle(Event::StartElement(start("DOC")))?;
    builder.handle(Event::Data {
        text: "x".into(),
        location: Location::unknown(5),
    })?;
    builder.handle(Event::EndElement)?;
    assert!(!grove.is_complete());

    builder.handle(Event::EndDocument)?;
    assert!(grove.is_complete());
    assert!(grove.generation().is_newer_than(before));
    assert!(grove.wait_for_more_nodes(before));

    assert_eq!(builder.handle(Event::EndDocument), Err(BuildError::Complete));
    assert_eq!(builder.data("y", &Location::unknown(9)), Err(BuildError::Complete));
    assert!(grove.is_complete());
    assert_eq!(grove.root().document_element()?.first_child()?.char_chunk()?, "x");
    Ok(())
}

#[test]
fn test_nodes_outlive_dropped_builder() -> anyhow::Result<()> {
    let node = {
        let mut builder = GroveBuilder::default();
        builder.start_element(start("DOC"))?;
        builder.data("kept", &Location::unknown(5))?;
        builder.root()
    };

    // Dropping the builder completed the grove and stored the pending run
    assert!(node.grove().is_complete());
    let doc = node.document_element()?;
    assert_eq!(doc.first_child()?.char_chunk()?, "kept");
    assert_eq!(doc.next_sibling(), Err(AccessError::Absent));
    Ok(())
}

#[test]
fn test_many_readers_see_the_whole_document() -> anyhow::Result<()> {
    try_init();
    const ITEMS: usize = 300;
    let mut builder = GroveBuilder::default();
    let root = builder.root();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let root = root.clone();
            thread::spawn(move || -> Result<(usize, String), AccessError> {
                let doc = root.document_element()?;
                let mut pis = 0;
                let mut text = String::new();
                for node in &doc.children()? {
                    let node = node?;
                    match node.char() {
                        Ok(c) => text.push(c),
                        Err(AccessError::WrongClass) => pis += 1,
                        Err(err) => return Err(err),
                    }
                }
                Ok((pis, text))
            })
        })
        .collect();

    builder.start_element(start("DOC"))?;
    for i in 0..ITEMS {
        builder.data(&(i % 10).to_string(), &Location::unknown(i as u32))?;
        builder.pi("sep", &Location::unknown(i as u32))?;
    }
    builder.end_element()?;
    builder.end_document()?;

    let expected: String = (0..ITEMS).map(|i| char::from(b'0' + (i % 10) as u8)).collect();
    for reader in readers {
        let (pis, text) = reader.join().expect("reader panicked")?;
        assert_eq!(pis, ITEMS);
        assert_eq!(text, expected);
    }
    Ok(())
}
