//! Integration tests for descriptor parsing and rendering.

use ironpix::descriptor::{ImageDescriptor, parse_descriptor, render_descriptor};
use ironpix::IngestError;

#[test]
fn test_parse_counts_entries_and_bounds_labels() -> anyhow::Result<()> {
    let cases = [
        "/data|a.png,0/1",
        "/data|cats/1.png,0/3|dogs/2.png,1/3|birds/3.png,2/3",
        "hdfs://nn:8020/images|x/1.jpg,4/5|x/2.jpg,4/5|y/3.jpg,0/5|z/4.jpg,3/5",
    ];
    for data_source in cases {
        let request = parse_descriptor(data_source)?;
        let expected = data_source.split('|').count() - 1;
        assert_eq!(request.len(), expected, "{data_source}");
        for d in &request {
            assert!(d.label_index() < d.label_count());
        }
    }
    Ok(())
}

#[test]
fn test_parse_derives_paths() -> anyhow::Result<()> {
    let request = parse_descriptor("hdfs://nn:8020/images|cats/1.png,0/2|dogs/2.png,1/2")?;
    assert_eq!(request.prefix(), "hdfs://nn:8020/images");

    let first = &request.descriptors()[0];
    assert_eq!(first.path(), "hdfs://nn:8020/images/cats/1.png");
    assert_eq!(first.full_path(), "/images/cats/1.png");
    assert_eq!(first.file_name(), "1.png");
    assert_eq!(first.parent_dir(), "cats");
    assert_eq!(first.one_hot(), vec![1, 0]);

    let second = &request.descriptors()[1];
    assert_eq!(second.parent_dir(), "dogs");
    assert_eq!(second.one_hot(), vec![0, 1]);
    assert_eq!(request.label_count(), Some(2));
    Ok(())
}

#[test]
fn test_parse_plain_paths_and_commas() -> anyhow::Result<()> {
    let request = parse_descriptor("/srv|a,b/c,d.png,1/2")?;
    let d = &request.descriptors()[0];
    assert_eq!(d.path(), "/srv/a,b/c,d.png");
    assert_eq!(d.full_path(), "/srv/a,b/c,d.png");
    assert_eq!(d.file_name(), "c,d.png");
    assert_eq!(d.parent_dir(), "a,b");
    assert_eq!(d.label_index(), 1);
    Ok(())
}

#[test]
fn test_parse_prefix_only_is_empty() -> anyhow::Result<()> {
    let request = parse_descriptor("/data/images")?;
    assert!(request.is_empty());
    assert_eq!(request.label_count(), None);
    Ok(())
}

#[test]
fn test_parse_rejects_malformed_entries() {
    let bad = [
        "/data|a.png",
        "/data|a.png,1",
        "/data|a.png,x/2",
        "/data|a.png,0/y",
        "/data|a.png,2/2",
        "/data|,0/2",
        "/data|a.png,0/2|",
        "/data|a.png,-1/2",
    ];
    for data_source in bad {
        let err = parse_descriptor(data_source).unwrap_err();
        assert!(
            matches!(err, IngestError::MalformedDescriptor { .. }),
            "{data_source}: {err}"
        );
    }
}

#[test]
fn test_parse_rejects_mixed_label_counts() {
    let err = parse_descriptor("/data|a.png,0/2|b.png,0/3").unwrap_err();
    match err {
        IngestError::MalformedDescriptor { entry, reason } => {
            assert_eq!(entry, "b.png,0/3");
            assert!(reason.contains("label count"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_render_matches_parser() -> anyhow::Result<()> {
    let entries = [("cats/1.png", 0, 3), ("dogs/7.png", 1, 3), ("fish/2.png", 2, 3)];
    let data_source = render_descriptor("mem:///pets", &entries);
    assert_eq!(
        data_source,
        "mem:///pets|cats/1.png,0/3|dogs/7.png,1/3|fish/2.png,2/3"
    );

    let request = parse_descriptor(&data_source)?;
    let parsed: Vec<(&str, usize)> = request
        .iter()
        .map(|d| (d.file_name(), d.label_index()))
        .collect();
    assert_eq!(parsed, vec![("1.png", 0), ("7.png", 1), ("2.png", 2)]);
    Ok(())
}

#[test]
fn test_descriptor_at_root_has_no_parent() -> anyhow::Result<()> {
    let d = ImageDescriptor::new("/top.png", 0, 1)?;
    assert_eq!(d.file_name(), "top.png");
    assert_eq!(d.parent_dir(), "");
    assert!(ImageDescriptor::new("/top.png", 1, 1).is_err());
    Ok(())
}

#[test]
fn test_parse_decodes_escaped_paths() -> anyhow::Result<()> {
    let request = parse_descriptor("file:///data|café/chat noir.png,0/1")?;
    let d = &request.descriptors()[0];
    assert_eq!(d.path(), "file:///data/café/chat noir.png");
    assert_eq!(d.full_path(), "/data/café/chat noir.png");
    assert_eq!(d.file_name(), "chat noir.png");
    assert_eq!(d.parent_dir(), "café");

    let request = parse_descriptor("hdfs://nn:8020/data|my%20dir/x.png,0/1")?;
    let d = &request.descriptors()[0];
    assert_eq!(d.full_path(), "/data/my dir/x.png");
    assert_eq!(d.parent_dir(), "my dir");

    assert!(matches!(
        parse_descriptor("mem:///data|bad/%FF.png,0/1"),
        Err(IngestError::MalformedDescriptor { .. })
    ));
    Ok(())
}
