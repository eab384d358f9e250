//! End-to-end tests: descriptor in, row out.

use ironpix::config::{AccessorConfig, ColumnTypes, ScanConfig};
use ironpix::descriptor::{parse_descriptor, render_descriptor};
use ironpix::fields::{DataType, FieldValue};
use ironpix::logging::{LogConfig, LogLevel, init_logging};
use ironpix::scan::{ImageAccessor, scan_fragment};
use ironpix::segment::FileSplit;
use ironpix::storage::SchemeRegistry;
use ironpix::testing::{FragmentFixture, assert_row_aligned, write_png_tree};
use ironpix::IngestError;
use std::sync::Arc;
use std::thread;

fn config(threads: usize, columns: ColumnTypes) -> ScanConfig {
    ScanConfig::new(
        AccessorConfig {
            threads,
            normalize: false,
        },
        columns,
    )
}

fn array_config(threads: usize) -> ScanConfig {
    config(threads, ColumnTypes::default())
}

fn pets() -> anyhow::Result<FragmentFixture> {
    let mut fixture = FragmentFixture::new("mem:///pets");
    fixture.add_solid("cats/tom.png", 0, 2, 2, 2, [200, 10, 10])?;
    fixture.add_solid("dogs/rex.png", 1, 2, 2, 2, [10, 200, 10])?;
    fixture.add_solid("cats/kit.png", 0, 2, 2, 2, [10, 10, 200])?;
    Ok(fixture)
}

#[test]
fn test_row_is_read_once() -> anyhow::Result<()> {
    let fixture = pets()?;
    let mut accessor = ImageAccessor::new(array_config(2), fixture.resolver());

    assert!(accessor.open_for_read(&fixture.descriptor(), FileSplit::first())?);
    assert!(accessor.is_open());
    let row = accessor.read_next_row()?.expect("owner produces a row");
    assert_eq!(row.image_count(), 3);
    assert_row_aligned(&row.metadata, &parse_descriptor(&fixture.descriptor())?);

    assert!(!accessor.is_open());
    assert!(accessor.read_next_row()?.is_none());
    assert!(accessor.read_next_row()?.is_none());
    Ok(())
}

#[test]
fn test_only_first_split_produces_row() -> anyhow::Result<()> {
    let fixture = pets()?;
    let descriptor = fixture.descriptor();
    let splits = [FileSplit::new(0, 1 << 20), FileSplit::new(1 << 20, 1 << 20)];

    let rows: Vec<Option<usize>> = thread::scope(|scope| {
        let handles: Vec<_> = splits
            .iter()
            .map(|split| {
                let resolver = fixture.resolver();
                let descriptor = descriptor.as_str();
                scope.spawn(move || -> anyhow::Result<Option<usize>> {
                    let row = scan_fragment(array_config(2), resolver, descriptor, *split)?;
                    Ok(row.map(|r| r.image_count()))
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("scan thread panicked"))
            .collect::<anyhow::Result<Vec<_>>>()
    })?;

    assert_eq!(rows, vec![Some(3), None]);
    assert_eq!(fixture.filesystem().open_count(), 3);
    Ok(())
}

#[test]
fn test_non_owner_skips_parsing() -> anyhow::Result<()> {
    let mut accessor = ImageAccessor::new(array_config(1), Arc::new(SchemeRegistry::default()));
    assert!(!accessor.open_for_read("garbage|no-label", FileSplit::new(64, 64))?);
    assert!(accessor.read_next_row()?.is_none());

    let err = accessor
        .open_for_read("garbage|no-label", FileSplit::first())
        .unwrap_err();
    assert!(matches!(err, IngestError::MalformedDescriptor { .. }));
    Ok(())
}

#[test]
fn test_empty_fragment_opens_nothing() -> anyhow::Result<()> {
    let mut accessor = ImageAccessor::new(array_config(1), Arc::new(SchemeRegistry::default()));
    assert!(!accessor.open_for_read("/data/images", FileSplit::first())?);
    assert!(accessor.read_next_row()?.is_none());
    Ok(())
}

#[test]
fn test_bad_image_emits_no_row() -> anyhow::Result<()> {
    let mut fixture = pets()?;
    fixture.add_file("dogs/corrupt.png", 1, 2, vec![0x89, b'P', b'N', b'G', 0, 0])?;
    let mut accessor = ImageAccessor::new(array_config(8), fixture.resolver());

    assert!(accessor.open_for_read(&fixture.descriptor(), FileSplit::first())?);
    match accessor.read_next_row() {
        Err(IngestError::ImageDecodeFailed { path, .. }) => {
            assert_eq!(path, "mem:///pets/dogs/corrupt.png");
        }
        other => panic!("expected decode failure, got {other:?}"),
    }
    assert!(accessor.read_next_row()?.is_none());
    Ok(())
}

#[test]
fn test_mixed_dimensions_emit_no_row() -> anyhow::Result<()> {
    let mut fixture = pets()?;
    fixture.add_solid("dogs/big.png", 1, 2, 3, 3, [0, 0, 0])?;
    let result = scan_fragment(array_config(4), fixture.resolver(), &fixture.descriptor(), FileSplit::first());
    assert!(matches!(result, Err(IngestError::DimensionMismatch { .. })));
    Ok(())
}

#[test]
fn test_local_files() -> anyhow::Result<()> {
    let dir = write_png_tree(
        3,
        1,
        &[("cats/a.png", [1, 2, 3]), ("dogs/b.png", [4, 5, 6])],
    )?;
    let prefix = dir.path().display().to_string();
    let descriptor = render_descriptor(&prefix, &[("cats/a.png", 0, 2), ("dogs/b.png", 1, 2)]);

    let columns = ColumnTypes::new(DataType::TextArray, DataType::Bytea, DataType::Bytea);
    let mut row = scan_fragment(
        config(2, columns),
        Arc::new(SchemeRegistry::default()),
        &descriptor,
        FileSplit::first(),
    )?
    .expect("owner produces a row");

    assert_eq!(
        row.metadata.full_paths,
        FieldValue::TextArray(vec![
            format!("{prefix}/cats/a.png"),
            format!("{prefix}/dogs/b.png"),
        ])
    );
    assert_eq!(row.metadata.labels, FieldValue::Bytes(vec![1, 0, 0, 1]));
    assert_eq!(row.metadata.dimensions, FieldValue::IntArray(vec![2, 1, 3, 3]));

    let mut out = Vec::new();
    row.images.write_to(&mut out)?;
    assert_eq!(
        out,
        vec![1, 2, 3, 1, 2, 3, 1, 2, 3, 4, 5, 6, 4, 5, 6, 4, 5, 6]
    );
    Ok(())
}

#[test]
fn test_metrics_follow_the_scan() -> anyhow::Result<()> {
    init_logging(&LogConfig::new(LogLevel::Debug, Default::default()))?;

    let fixture = pets()?;
    let mut accessor = ImageAccessor::new(array_config(2), fixture.resolver());
    accessor.open_for_read(&fixture.descriptor(), FileSplit::first())?;
    let row = accessor.read_next_row()?.expect("owner produces a row");
    let encoded: usize = row.images.map(|image| image.map(|i| i.len())).sum::<ironpix::Result<usize>>()?;

    let snapshot = accessor.metrics().snapshot();
    assert_eq!(snapshot.images_fetched, 3);
    assert_eq!(snapshot.images_encoded, 3);
    assert_eq!(snapshot.fetch_chunks, 2);
    assert_eq!(snapshot.encode_chunks, 2);
    assert_eq!(snapshot.bytes_encoded, encoded as u64);

    let json: serde_json::Value = serde_json::from_str(&accessor.metrics().to_json()?)?;
    assert_eq!(json["images_encoded"], 3);
    Ok(())
}
