//! Round-trip Tests
//!
//! Builds containers through the public API, renders them to wire text and
//! reads them back.

use std::any::Any;

use chrono::{TimeZone, Utc};
use familiar_metadata::{
    Array, ElementKind, FixedMetadata, Key, Metadata, MetadataCodec, MetadataError, MetadataExt,
    MetadataManager, MetadataManagerCollection, MetadataSerializer, OutputFormat, Proxy, ProxyKey,
    ProxyObject, ProxyRegistry, Result, SettableMetadata, Value, Version,
};

fn round_trip(metadata: &dyn Metadata, registry: &ProxyRegistry) -> FixedMetadata {
    let codec = MetadataCodec::new(registry);
    let text = codec.render(metadata, OutputFormat::Pretty).unwrap();
    codec.parse(&text).unwrap().into_fixed()
}

// =============================================================================
// Scalars and collections
// =============================================================================

#[test]
fn test_scalars_and_null() {
    let k1 = Key::<i32>::of("k1").unwrap();
    let k2 = Key::<String>::of("k2").unwrap();
    let k3 = Key::<String>::of("k3").unwrap();

    let mut metadata = SettableMetadata::new(Version::new(1, 0));
    metadata.put(&k1, 5).unwrap();
    metadata.put(&k2, "hello".to_string()).unwrap();
    metadata.put_null(&k3);

    let back = round_trip(&metadata, &ProxyRegistry::new());
    assert_eq!(back.get(&k1).unwrap(), Some(5));
    assert_eq!(back.get(&k2).unwrap(), Some("hello".to_string()));
    assert!(back.has_key(&k3));
    assert_eq!(back.get(&k3).unwrap(), None);
    assert_eq!(back, metadata);
}

#[test]
fn test_list_keeps_order() {
    let numbers = Key::<Vec<i32>>::of("numbers").unwrap();
    let mut metadata = SettableMetadata::new(Version::new(1, 0));
    metadata.put(&numbers, vec![1, 2, 3]).unwrap();

    let back = round_trip(&metadata, &ProxyRegistry::new());
    assert_eq!(back.get(&numbers).unwrap(), Some(vec![1, 2, 3]));
}

#[test]
fn test_every_scalar_kind() {
    let mut metadata = SettableMetadata::new(Version::new(3, 1));
    let when = Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, 0).unwrap();
    metadata.put(&Key::of("s").unwrap(), "text".to_string()).unwrap();
    metadata.put(&Key::of("c").unwrap(), 'λ').unwrap();
    metadata.put(&Key::of("b").unwrap(), true).unwrap();
    metadata.put(&Key::of("i8").unwrap(), -8i8).unwrap();
    metadata.put(&Key::of("i16").unwrap(), 16i16).unwrap();
    metadata.put(&Key::of("i32").unwrap(), -32i32).unwrap();
    metadata.put(&Key::of("i64").unwrap(), i64::MAX).unwrap();
    metadata.put(&Key::of("f32").unwrap(), 0.1f32).unwrap();
    metadata.put(&Key::of("f64").unwrap(), f64::NEG_INFINITY).unwrap();
    metadata.put(&Key::of("date").unwrap(), when).unwrap();
    metadata.put(&Key::of("version").unwrap(), Version::new(7, 9)).unwrap();
    metadata
        .put(&Key::of("key").unwrap(), Key::<i32>::of("target").unwrap())
        .unwrap();

    let back = round_trip(&metadata, &ProxyRegistry::new());
    assert_eq!(back, metadata);
    assert_eq!(back.get(&Key::<f32>::of("f32").unwrap()).unwrap(), Some(0.1f32));
    assert_eq!(back.get(&Key::of("date").unwrap()).unwrap(), Some(when));
}

#[test]
fn test_doubles_keep_every_bit() {
    let x = Key::<f64>::of("x").unwrap();
    let samples = [1.744481002004883e-234, 0.1 + 0.2, f64::MIN_POSITIVE, 5e-324, 123456.789e300];
    for sample in samples {
        let mut metadata = SettableMetadata::new(Version::new(1, 0));
        metadata.put(&x, sample).unwrap();
        let back = round_trip(&metadata, &ProxyRegistry::new());
        let restored = back.get(&x).unwrap().unwrap();
        assert_eq!(restored.to_bits(), sample.to_bits(), "sample {:e}", sample);
    }
}

#[test]
fn test_nested_metadata_and_maps() {
    let mut inner = SettableMetadata::new(Version::new(1, 4));
    inner.put(&Key::of("depth").unwrap(), 1i32).unwrap();

    let mut outer = SettableMetadata::new(Version::new(2, 0));
    outer.put(&Key::of("inner").unwrap(), inner.freeze()).unwrap();
    outer
        .put_value(
            &Key::<Value>::of("lookup").unwrap(),
            Value::sorted_map(vec![(3i32, "three"), (1, "one")]),
        )
        .unwrap();
    outer
        .put_value(
            &Key::<Value>::of("grid").unwrap(),
            Value::Array(Array::primitive(
                ElementKind::Double,
                vec![Value::Double(0.5), Value::Double(f64::NAN)],
            )),
        )
        .unwrap();

    let back = round_trip(&outer, &ProxyRegistry::new());
    assert_eq!(back, outer);
    let nested = back
        .get(&Key::<FixedMetadata>::of("inner").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(nested.version(), Version::new(1, 4));
}

#[test]
fn test_end_to_end_version_and_name() {
    let name = Key::<String>::of("name").unwrap();
    let mut metadata = SettableMetadata::new(Version::of(2, 3).unwrap());
    metadata.put(&name, "Eros".to_string()).unwrap();

    let registry = ProxyRegistry::new();
    let codec = MetadataCodec::new(&registry);
    let text = codec.render(&metadata, OutputFormat::Compact).unwrap();
    let back = codec.parse(&text).unwrap();

    assert_eq!(back.version(), Version::of(2, 3).unwrap());
    assert_eq!(back.get(&name).unwrap(), Some("Eros".to_string()));
}

#[test]
fn test_unknown_tag_is_parse_error() {
    let registry = ProxyRegistry::new();
    let text = r#"[["Version", "1.0"], {"x": ["Quaternion", [1, 0, 0, 0]]}]"#;
    let result = MetadataCodec::new(&registry).parse(text);
    assert!(matches!(result, Err(MetadataError::Parse(_))));
}

// =============================================================================
// Proxies
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Swatch {
    name: String,
    rgb: i32,
}

fn swatch_key() -> ProxyKey {
    Key::of("coloring.swatch").unwrap()
}

impl ProxyObject for Swatch {
    fn proxy_key(&self) -> ProxyKey {
        swatch_key()
    }

    fn store(&self) -> Result<FixedMetadata> {
        let mut metadata = SettableMetadata::new(Version::new(1, 0));
        metadata.put(&Key::of("name")?, self.name.clone())?;
        metadata.put(&Key::of("rgb")?, self.rgb)?;
        Ok(metadata.into_fixed())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn swatch_factory(metadata: &FixedMetadata) -> Result<Swatch> {
    let name = metadata.get(&Key::<String>::of("name")?)?.unwrap_or_default();
    let rgb = metadata.get(&Key::<i32>::of("rgb")?)?.unwrap_or_default();
    Ok(Swatch { name, rgb })
}

fn swatch_registry() -> ProxyRegistry {
    let mut registry = ProxyRegistry::new();
    registry.register(&swatch_key(), swatch_factory).unwrap();
    registry
}

#[test]
fn test_proxy_round_trip() {
    let original = Swatch {
        name: "ember".to_string(),
        rgb: 0xd2_4b_1e,
    };
    let color = Key::<Proxy>::of("color").unwrap();
    let mut metadata = SettableMetadata::new(Version::new(1, 0));
    metadata.put(&color, Proxy::new(original.clone())).unwrap();

    let back = round_trip(&metadata, &swatch_registry());
    let proxy = back.get(&color).unwrap().unwrap();
    assert_eq!(proxy.downcast_ref::<Swatch>(), Some(&original));
}

#[test]
fn test_unregistered_proxy_fails_both_ways() {
    let color = Key::<Proxy>::of("color").unwrap();
    let mut metadata = SettableMetadata::new(Version::new(1, 0));
    metadata
        .put(&color, Proxy::new(Swatch { name: "x".to_string(), rgb: 0 }))
        .unwrap();

    let empty = ProxyRegistry::new();
    let encoded = MetadataCodec::new(&empty).render(&metadata, OutputFormat::Pretty);
    assert!(matches!(encoded, Err(MetadataError::Unsupported(_))));

    let registry = swatch_registry();
    let text = MetadataCodec::new(&registry)
        .render(&metadata, OutputFormat::Pretty)
        .unwrap();
    let decoded = MetadataCodec::new(&empty).parse(&text);
    assert!(matches!(decoded, Err(MetadataError::Parse(_))));
}

// =============================================================================
// Serializer façade
// =============================================================================

#[derive(Debug, Default, PartialEq)]
struct Palette {
    swatches: Vec<String>,
    accent: Option<Swatch>,
}

impl MetadataManager for Palette {
    fn store(&self) -> Result<FixedMetadata> {
        let mut metadata = SettableMetadata::new(Version::new(1, 2));
        metadata.put(&Key::of("swatches")?, self.swatches.clone())?;
        match &self.accent {
            Some(accent) => metadata.put(&Key::of("accent")?, Proxy::new(accent.clone()))?,
            None => metadata.put_null(&Key::<Proxy>::of("accent")?),
        }
        Ok(metadata.into_fixed())
    }

    fn retrieve(&mut self, metadata: &dyn Metadata) -> Result<()> {
        self.swatches = metadata.get(&Key::of("swatches")?)?.unwrap_or_default();
        self.accent = metadata
            .get(&Key::<Proxy>::of("accent")?)?
            .and_then(|proxy| proxy.downcast_ref::<Swatch>().cloned());
        Ok(())
    }
}

#[test]
fn test_serializer_restores_collection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("palettes.json");
    let serializer = MetadataSerializer::new(swatch_registry());

    let warm = Palette {
        swatches: vec!["red".to_string(), "orange".to_string()],
        accent: Some(Swatch { name: "gold".to_string(), rgb: 0xffd700 }),
    };
    let cool = Palette {
        swatches: vec!["blue".to_string()],
        accent: None,
    };

    let mut sources = MetadataManagerCollection::new();
    sources.add(Key::of("warm").unwrap(), warm).unwrap();
    sources.add(Key::of("cool").unwrap(), cool).unwrap();
    serializer.serialize_all(&sources, &path).unwrap();

    let mut warm_back = Palette::default();
    let mut cool_back = Palette::default();
    {
        let mut targets = MetadataManagerCollection::new();
        targets.add(Key::of("warm").unwrap(), &mut warm_back).unwrap();
        targets.add(Key::of("cool").unwrap(), &mut cool_back).unwrap();
        serializer.deserialize_all(&path, &mut targets).unwrap();
    }

    assert_eq!(warm_back.swatches, vec!["red", "orange"]);
    assert_eq!(warm_back.accent.as_ref().map(|s| s.rgb), Some(0xffd700));
    assert_eq!(cool_back, Palette { swatches: vec!["blue".to_string()], accent: None });
}
