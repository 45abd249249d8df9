use anyhow::Result;
use futures_util::TryStreamExt;
use ipld_core::ipld::Ipld;
use rand::{Rng, SeedableRng, rngs::StdRng};
use strata_log::{Buffer, Log, LogOptions, Message, Node, NodeStore, Payload, StorageSpec, Summary};
use strata_storage::{BlobStore, CborEncoder};

const TEST_SEED: u64 = 42;

fn make_store() -> Result<NodeStore<CborEncoder>> {
    Ok(NodeStore::new(
        CborEncoder,
        BlobStore::default(),
        StorageSpec::single("mem://blobs/logs".parse()?),
    )?)
}

#[tokio::test]
async fn it_appends_and_fetches_strings() -> Result<()> {
    let store = make_store()?;
    let log = Log::new(LogOptions::default())?;
    let log = log.append("hello", &store).await?;
    let log = log.append("world", &store).await?;

    let messages: Vec<Message> = log.fetch(0, &store).try_collect().await?;
    assert_eq!(
        messages,
        vec![
            Message::Text("hello".to_string()),
            Message::Text("world".to_string())
        ]
    );

    let suffix: Vec<Message> = log.fetch(1, &store).try_collect().await?;
    assert_eq!(suffix, vec![Message::Text("world".to_string())]);

    let summary = log.summarise();
    assert_eq!(summary.tail.l(), 2);
    assert!(summary.root.is_empty_tree());

    Ok(())
}

#[tokio::test]
async fn it_round_trips_mixed_messages_from_every_offset() -> Result<()> {
    let store = make_store()?;
    let mut rng = StdRng::seed_from_u64(TEST_SEED);

    let mut log = Log::new(LogOptions {
        branching_factor: 4,
        max_inline_bytes: 512,
        optimal_slab_bytes: 1024,
    })?;
    let mut expected = Vec::new();

    for index in 0..120i64 {
        match index % 3 {
            0 => {
                let text = format!("message-{index}");
                expected.push(Message::Text(text.clone()));
                log = log.append(text, &store).await?;
            }
            1 => {
                let bytes: Vec<u8> = (0..rng.gen_range(1..200)).map(|_| rng.r#gen()).collect();
                expected.push(Message::Bytes(bytes.clone().into()));
                log = log.append(bytes, &store).await?;
            }
            _ => {
                expected.push(Message::Value(Ipld::Integer(index as i128)));
                log = log.append(Payload::encode(&index)?, &store).await?;
            }
        }
    }

    assert_eq!(log.length(), 120);

    let messages: Vec<Message> = log.fetch(0, &store).try_collect().await?;
    assert_eq!(messages, expected);

    for offset in (0..=120).step_by(7) {
        let suffix: Vec<Message> = log.fetch(offset as u64, &store).try_collect().await?;
        assert_eq!(suffix, expected[offset..], "offset {offset}");
    }

    Ok(())
}

#[tokio::test]
async fn it_routes_an_oversized_payload_around_the_inline_area() -> Result<()> {
    let store = make_store()?;
    let log = Log::new(LogOptions::default())?;

    let payload = vec![7u8; 10 * 1024];
    let log = log.append(payload.clone(), &store).await?;

    let Summary::Tail {
        inline_bytes,
        buffers,
        nodes,
        ..
    } = log.summarise().tail
    else {
        panic!("tail summary expected");
    };
    assert_eq!(buffers, 0, "payload must not enter the inline area");
    assert!(inline_bytes < log.max_inline_bytes());
    assert!(matches!(nodes[..], [Summary::Slab { l: 1, .. }]));

    let messages: Vec<Message> = log.fetch(0, &store).try_collect().await?;
    assert_eq!(messages, vec![Message::Bytes(payload.into())]);

    Ok(())
}

#[tokio::test]
async fn it_appends_one_log_into_another() -> Result<()> {
    let store = make_store()?;

    let mut inner = Log::new(LogOptions::default())?;
    for text in ["a", "b", "c"] {
        inner = inner.append(text, &store).await?;
    }

    let mut outer = Log::new(LogOptions::default())?;
    for text in ["x", "y"] {
        outer = outer.append(text, &store).await?;
    }

    let combined = outer.append(&inner, &store).await?;

    assert_eq!(combined.length(), outer.length() + inner.length());

    let messages: Vec<Message> = combined.fetch(0, &store).try_collect().await?;
    let texts: Vec<_> = messages
        .iter()
        .map(|message| message.as_text().expect("text message"))
        .collect();
    assert_eq!(texts, vec!["x", "y", "a", "b", "c"]);

    Ok(())
}

#[tokio::test]
async fn it_appends_a_batch_equivalently_to_individual_appends() -> Result<()> {
    let store = make_store()?;

    let mut individual = Log::new(LogOptions::default())?;
    for text in ["a", "b", "c"] {
        individual = individual.append(text, &store).await?;
    }
    let expected: Vec<Message> = individual.fetch(0, &store).try_collect().await?;

    // The same three messages as a structural append of a whole log.
    let structural = Log::new(LogOptions::default())?
        .append(&individual, &store)
        .await?;
    let messages: Vec<Message> = structural.fetch(0, &store).try_collect().await?;
    assert_eq!(messages, expected);

    // And as a single embedded-node buffer wrapping that log.
    let embedded = Buffer::embed(&Node::from(individual.clone()), store.encoder()).await?;
    let wrapped = Log::new(LogOptions::default())?
        .append(embedded, &store)
        .await?;
    assert_eq!(wrapped.length(), 3);
    let messages: Vec<Message> = wrapped.fetch(0, &store).try_collect().await?;
    assert_eq!(messages, expected);

    Ok(())
}

#[tokio::test]
async fn it_fetches_an_empty_suffix_at_the_end_of_the_log() -> Result<()> {
    let store = make_store()?;
    let mut log = Log::new(LogOptions::default())?;
    for index in 0..5 {
        log = log.append(format!("message-{index}"), &store).await?;
    }

    let suffix: Vec<Message> = log.fetch(5, &store).try_collect().await?;
    assert!(suffix.is_empty());

    Ok(())
}

#[tokio::test]
async fn it_keeps_older_log_values_readable_after_append() -> Result<()> {
    let store = make_store()?;
    let before = Log::new(LogOptions::default())?
        .append("first", &store)
        .await?;
    let after = before.append("second", &store).await?;

    let old: Vec<Message> = before.fetch(0, &store).try_collect().await?;
    assert_eq!(old.len(), 1);

    let new: Vec<Message> = after.fetch(0, &store).try_collect().await?;
    assert_eq!(new.len(), 2);

    Ok(())
}
