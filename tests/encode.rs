//! Integration tests for the encode engine and its three encodings.

use ironpix::codec::StandardDecoder;
use ironpix::config::ColumnTypes;
use ironpix::descriptor::{FragmentRequest, parse_descriptor};
use ironpix::encode::metadata::decode_one_hot;
use ironpix::encode::{EncodeEngine, EncodedImage, ImageEncoding, OutputShape};
use ironpix::fetch::FetchEngine;
use ironpix::fields::{DataType, FieldValue, RowMetadata};
use ironpix::metrics::ScanMetrics;
use ironpix::pool::WorkerPool;
use ironpix::segment::{FileSplit, SegmentGate};
use ironpix::testing::{
    FragmentFixture, assert_normalized_pixel, assert_raw_pixel, assert_row_aligned,
    split_label_bytes,
};
use ironpix::IngestError;
use std::sync::Arc;

const ARRAY_INTS: ColumnTypes =
    ColumnTypes::new(DataType::TextArray, DataType::Int8Array, DataType::Int8Array);
const ARRAY_BYTES: ColumnTypes =
    ColumnTypes::new(DataType::TextArray, DataType::Bytea, DataType::Bytea);
const SCALAR_INTS: ColumnTypes =
    ColumnTypes::new(DataType::Text, DataType::Int8Array, DataType::Int8Array);

fn prepare(
    fixture: &FragmentFixture,
    threads: usize,
    columns: &ColumnTypes,
    normalize: bool,
) -> anyhow::Result<(EncodeEngine, RowMetadata, FragmentRequest)> {
    let request = parse_descriptor(&fixture.descriptor())?;
    let mut fetch = FetchEngine::new(
        WorkerPool::new(threads)?,
        Arc::new(StandardDecoder),
        ScanMetrics::new(),
    );
    fetch.open(&request, &SegmentGate::new(FileSplit::first()), &*fixture.resolver())?;
    let shape = OutputShape::negotiate(columns, normalize);
    let (engine, metadata) = EncodeEngine::prepare(fetch, &request, shape)?;
    Ok((engine, metadata, request))
}

fn gradient(x: u32, y: u32) -> [u8; 3] {
    [(x * 40) as u8, (y * 100) as u8, (x + y) as u8]
}

fn drain(engine: &mut EncodeEngine) -> anyhow::Result<Vec<EncodedImage>> {
    let mut images = Vec::new();
    while engine.has_next() {
        images.push(engine.next_image()?);
    }
    Ok(images)
}

#[test]
fn test_text_literal_two_by_one() -> anyhow::Result<()> {
    let mut fixture = FragmentFixture::new("mem:///lit");
    fixture.add_png("a/p.png", 0, 1, 2, 1, |x, _| {
        if x == 0 { [10, 20, 30] } else { [40, 50, 60] }
    })?;
    let (mut engine, _, _) = prepare(&fixture, 1, &ARRAY_INTS, false)?;

    let image = engine.next_image()?;
    assert_eq!(image.encoding(), ImageEncoding::TextArrayLiteral);
    assert_eq!(image, EncodedImage::TextArrayLiteral("{{10,20,30},{40,50,60}}".into()));
    Ok(())
}

#[test]
fn test_text_literal_rows_follow_height() -> anyhow::Result<()> {
    let mut fixture = FragmentFixture::new("mem:///lit");
    fixture.add_png("a/p.png", 0, 1, 2, 2, gradient)?;
    let (mut engine, _, _) = prepare(&fixture, 1, &ARRAY_INTS, false)?;

    assert_eq!(
        engine.next_image()?.as_bytes(),
        b"{{0,0,0},{40,0,1}},{{0,100,1},{40,100,2}}"
    );
    Ok(())
}

#[test]
fn test_normalized_text_literal() -> anyhow::Result<()> {
    let mut fixture = FragmentFixture::new("mem:///lit");
    fixture.add_solid("a/p.png", 0, 1, 1, 1, [0, 255, 1])?;
    let (mut engine, _, _) = prepare(&fixture, 1, &ARRAY_INTS, true)?;

    assert_eq!(
        engine.next_image()?,
        EncodedImage::TextArrayLiteral("{{0.0,1.0,0.003921569}}".into())
    );
    Ok(())
}

#[test]
fn test_raw_bitmap_pixels() -> anyhow::Result<()> {
    let mut fixture = FragmentFixture::new("mem:///raw");
    fixture.add_png("a/p.png", 0, 1, 3, 2, gradient)?;
    let (mut engine, _, _) = prepare(&fixture, 2, &ARRAY_BYTES, false)?;

    let image = engine.next_image()?;
    assert_eq!(image.encoding(), ImageEncoding::RawByteBitmap);
    assert_eq!(image.len(), 3 * 2 * 3);
    for y in 0..2 {
        for x in 0..3 {
            assert_raw_pixel(image.as_bytes(), 3, x, y, gradient(x, y));
        }
    }
    Ok(())
}

#[test]
fn test_normalized_bitmap_pixels() -> anyhow::Result<()> {
    let mut fixture = FragmentFixture::new("mem:///float");
    fixture.add_png("a/p.png", 0, 1, 3, 2, gradient)?;
    let (mut engine, _, _) = prepare(&fixture, 2, &ARRAY_BYTES, true)?;

    let image = engine.next_image()?;
    assert_eq!(image.encoding(), ImageEncoding::NormalizedFloatBitmap);
    assert_eq!(image.len(), 3 * 2 * 3 * 4);
    for y in 0..2 {
        for x in 0..3 {
            assert_normalized_pixel(image.as_bytes(), 3, x, y, gradient(x, y));
        }
    }
    // (40, 0, 1) at (1, 0): the red channel's exact big-endian bits
    let red = &image.as_bytes()[12..16];
    assert_eq!(red, &((40.0f64 / 255.0) as f32).to_be_bytes());
    Ok(())
}

#[test]
fn test_three_images_two_threads_then_exhausted() -> anyhow::Result<()> {
    let mut fixture = FragmentFixture::new("mem:///three");
    for i in 0..3u8 {
        fixture.add_solid(&format!("d/{i}.png"), 0, 1, 2, 2, [i, i, i])?;
    }
    let (mut engine, _, _) = prepare(&fixture, 2, &ARRAY_BYTES, false)?;

    let images = drain(&mut engine)?;
    assert_eq!(images.len(), 3);
    for (i, image) in images.iter().enumerate() {
        assert_eq!(image.as_bytes()[0], i as u8);
    }
    assert!(!engine.has_next());
    assert!(matches!(engine.next_image(), Err(IngestError::StreamExhausted)));

    let snapshot = engine.metrics().snapshot();
    assert_eq!(snapshot.fetch_chunks, 2);
    assert_eq!(snapshot.encode_chunks, 2);
    assert_eq!(snapshot.images_encoded, 3);
    assert_eq!(snapshot.bytes_encoded, 3 * 12);
    Ok(())
}

#[test]
fn test_array_row_columns_align() -> anyhow::Result<()> {
    let labels = [2usize, 0, 1, 2, 0];
    let mut fixture = FragmentFixture::new("mem:///zoo");
    for (i, label) in labels.iter().enumerate() {
        let dir = ["cats", "dogs", "fish"][*label];
        fixture.add_solid(&format!("{dir}/{i}.png"), *label, 3, 2, 1, [i as u8 * 50, 0, 0])?;
    }

    for columns in [ARRAY_INTS, ARRAY_BYTES] {
        let (mut engine, metadata, request) = prepare(&fixture, 2, &columns, false)?;
        assert_row_aligned(&metadata, &request);
        assert_eq!(metadata.dimensions, FieldValue::IntArray(vec![5, 1, 2, 3]));

        let images = drain(&mut engine)?;
        assert_eq!(images.len(), labels.len());
        if columns.image == DataType::Bytea {
            for (i, image) in images.iter().enumerate() {
                assert_eq!(image.as_bytes()[0], i as u8 * 50, "image {i} out of order");
            }
        } else {
            for (i, image) in images.iter().enumerate() {
                let expected = format!("{{{{{},0,0}},", i * 50);
                assert!(
                    String::from_utf8_lossy(image.as_bytes()).starts_with(&expected),
                    "image {i} out of order"
                );
            }
        }
    }
    Ok(())
}

#[test]
fn test_one_hot_labels_round_trip() -> anyhow::Result<()> {
    let mut fixture = FragmentFixture::new("mem:///labels");
    fixture.add_solid("a/0.png", 3, 4, 1, 1, [0, 0, 0])?;
    fixture.add_solid("b/1.png", 0, 4, 1, 1, [0, 0, 0])?;
    fixture.add_solid("c/2.png", 2, 4, 1, 1, [0, 0, 0])?;
    let expected = [3, 0, 2];

    let (_, metadata, _) = prepare(&fixture, 3, &ARRAY_BYTES, false)?;
    let FieldValue::Bytes(bytes) = &metadata.labels else {
        panic!("binary labels expected, got {:?}", metadata.labels);
    };
    assert_eq!(bytes.len(), 12);
    for (vector, index) in split_label_bytes(bytes, 4).iter().zip(expected) {
        assert_eq!(vector.iter().filter(|&&b| b != 0).count(), 1);
        assert_eq!(decode_one_hot(vector.as_slice()), Some(index));
    }

    let (_, metadata, _) = prepare(&fixture, 3, &ARRAY_INTS, false)?;
    let FieldValue::IntMatrix(rows) = &metadata.labels else {
        panic!("label matrix expected, got {:?}", metadata.labels);
    };
    let decoded: Vec<Option<usize>> = rows.iter().map(|r| decode_one_hot(r.as_slice())).collect();
    assert_eq!(decoded, vec![Some(3), Some(0), Some(2)]);
    Ok(())
}

#[test]
fn test_scalar_row() -> anyhow::Result<()> {
    let mut fixture = FragmentFixture::new("mem:///single");
    fixture.add_solid("birds/robin.png", 1, 3, 4, 2, [9, 8, 7])?;

    let (mut engine, metadata, _) = prepare(&fixture, 4, &SCALAR_INTS, false)?;
    assert_eq!(metadata.full_paths, FieldValue::Text("/single/birds/robin.png".into()));
    assert_eq!(metadata.file_names, FieldValue::Text("robin.png".into()));
    assert_eq!(metadata.parent_dirs, FieldValue::Text("birds".into()));
    assert_eq!(metadata.labels, FieldValue::IntArray(vec![0, 1, 0]));
    assert_eq!(metadata.dimensions, FieldValue::IntArray(vec![2, 4, 3]));
    assert_eq!((engine.width(), engine.height()), (4, 2));

    assert!(engine.next_image().is_ok());
    assert!(!engine.has_next());
    Ok(())
}

#[test]
fn test_scalar_row_rejects_several_images() -> anyhow::Result<()> {
    let mut fixture = FragmentFixture::new("mem:///single");
    fixture.add_solid("a/1.png", 0, 1, 1, 1, [0, 0, 0])?;
    fixture.add_solid("a/2.png", 0, 1, 1, 1, [0, 0, 0])?;

    let err = prepare(&fixture, 1, &SCALAR_INTS, false).unwrap_err();
    assert!(
        matches!(err.downcast_ref::<IngestError>(), Some(IngestError::Config { .. })),
        "{err}"
    );
    Ok(())
}

#[test]
fn test_decode_failure_mid_stream() -> anyhow::Result<()> {
    let mut fixture = FragmentFixture::new("mem:///late");
    fixture.add_solid("a/1.png", 0, 1, 2, 2, [1, 1, 1])?;
    fixture.add_solid("a/2.png", 0, 1, 2, 2, [2, 2, 2])?;
    fixture.add_file("a/3.png", 0, 1, b"GIF89a-truncated".to_vec())?;

    let (mut engine, _, _) = prepare(&fixture, 1, &ARRAY_BYTES, false)?;
    let mut produced = 0;
    let err = loop {
        match engine.next_image() {
            Ok(_) => produced += 1,
            Err(err) => break err,
        }
    };
    assert!(produced < 3);
    match err {
        IngestError::ImageDecodeFailed { path, .. } => assert_eq!(path, "mem:///late/a/3.png"),
        other => panic!("expected decode failure, got {other}"),
    }
    Ok(())
}

#[test]
fn test_fetch_failure_aborts_buffered_images() -> anyhow::Result<()> {
    let mut fixture = FragmentFixture::new("mem:///late");
    fixture.add_solid("a/1.png", 0, 1, 2, 2, [1, 1, 1])?;
    fixture.add_solid("a/2.png", 0, 1, 2, 2, [2, 2, 2])?;
    fixture.add_file("a/3.png", 0, 1, b"GIF89a-truncated".to_vec())?;

    // the first call encodes [1, 2] and then fails pulling [3]
    let (mut engine, _, _) = prepare(&fixture, 2, &ARRAY_BYTES, false)?;
    match engine.next_image() {
        Err(IngestError::ImageDecodeFailed { path, .. }) => assert_eq!(path, "mem:///late/a/3.png"),
        other => panic!("expected decode failure, got {other:?}"),
    }
    assert!(engine.is_failed());
    assert!(!engine.has_next());
    assert_eq!(engine.remaining(), 0);
    for _ in 0..3 {
        assert!(matches!(engine.next_image(), Err(IngestError::StreamExhausted)));
    }
    assert_eq!(engine.produced(), 0);
    Ok(())
}

#[test]
fn test_shape_negotiation() {
    let shape = OutputShape::negotiate(&SCALAR_INTS, true);
    assert!(shape.scalar_mode);
    assert!(!shape.labels_as_bytes);
    assert_eq!(shape.encoding(), ImageEncoding::TextArrayLiteral);

    let shape = OutputShape::negotiate(&ARRAY_BYTES, false);
    assert!(!shape.scalar_mode);
    assert!(shape.labels_as_bytes);
    assert_eq!(shape.encoding(), ImageEncoding::RawByteBitmap);

    let shape = OutputShape::negotiate(&ARRAY_BYTES, true);
    assert_eq!(shape.encoding(), ImageEncoding::NormalizedFloatBitmap);
}
