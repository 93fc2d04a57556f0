#![allow(clippy::float_cmp)]

use indoc::indoc;
use resumable_json::{
    classify, from_reader, from_reader_with, from_slice_with_graph, from_str, from_str_with,
    json_object, to_string, to_vec_with, to_writer, ConverterRegistry, JsonOptions, JsonType,
    Shape,
};
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Read};

#[derive(Clone, Debug, Default, PartialEq)]
struct Address {
    street: String,
    zip: Option<u32>,
}

json_object!(Address { street as "Street", zip as "Zip" });

#[derive(Clone, Debug, Default, PartialEq)]
struct Person {
    name: String,
    age: u8,
    address: Address,
    tags: BTreeMap<String, bool>,
}

json_object!(Person { name as "Name", age as "Age", address as "Address", tags as "Tags" });

#[derive(Clone, Debug, Default, PartialEq)]
struct Node {
    value: i32,
    children: Vec<Node>,
}

json_object!(Node { value, children });

#[derive(Clone, Debug, Default, PartialEq)]
struct Empty {}

json_object!(Empty {});

fn test_parse_ok<T>(tests: &[(&str, T)])
where
    T: Clone + std::fmt::Debug + PartialEq + JsonType,
{
    for (s, value) in tests {
        let v: T = from_str(s).unwrap();
        assert_eq!(v, value.clone(), "input: {:?}", s);

        // Re-read what was written.
        let json = to_string(&v).unwrap();
        let twice: T = from_str(&json).unwrap();
        assert_eq!(twice, v);
    }
}

fn test_parse_err<T>(errors: &[(&str, &'static str)])
where
    T: std::fmt::Debug + JsonType,
{
    for &(s, err) in errors {
        assert_eq!(from_str::<T>(s).unwrap_err().to_string(), err, "input: {:?}", s);
    }
}

#[test]
fn test_write_scalars() {
    assert_eq!(to_string(&true).unwrap(), "true");
    assert_eq!(to_string(&-12i64).unwrap(), "-12");
    assert_eq!(to_string(&u64::MAX).unwrap(), "18446744073709551615");
    assert_eq!(to_string(&1.5f64).unwrap(), "1.5");
    assert_eq!(to_string(&f64::NAN).unwrap(), "null");
    assert_eq!(to_string(&'\u{7}').unwrap(), r#""\u0007""#);
    assert_eq!(to_string(&"tab\t".to_owned()).unwrap(), r#""tab\t""#);
    assert_eq!(to_string(&None::<u8>).unwrap(), "null");
    assert_eq!(to_string(&vec![Some(1u8), None]).unwrap(), "[1,null]");
}

#[test]
fn test_parse_numbers() {
    test_parse_ok(&[("0", 0u64), ("  42  ", 42), ("18446744073709551615", u64::MAX)]);
    test_parse_ok(&[("-128", i8::MIN), ("127", i8::MAX)]);
    test_parse_ok(&[("3.5", 3.5f64), ("-1e3", -1000.0), ("0.1", 0.1)]);

    test_parse_err::<u8>(&[
        ("256", "number out of range at line 1 column 3"),
        ("-1", "number out of range at line 1 column 2"),
        ("1.5", "invalid type: number, expected u8 at line 1 column 3"),
        ("01", "invalid number at line 1 column 2"),
        ("1 2", "trailing characters at line 1 column 3"),
    ]);
}

#[test]
fn test_parse_strings_and_options() {
    test_parse_ok(&[
        (r#""""#, String::new()),
        (r#""\"\\\/\b\f\n\r\t""#, "\"\\/\x08\x0c\n\r\t".to_owned()),
        (r#""é""#, "é".to_owned()),
    ]);
    test_parse_ok(&[("null", None), ("7", Some(7u16))]);
    test_parse_ok(&[("[]", vec![]), ("[null, 1]", vec![None, Some(1i32)])]);

    test_parse_err::<String>(&[
        ("\"abc", "EOF while parsing a string at line 1 column 4"),
        (r#""\x""#, "invalid escape at line 1 column 3"),
        ("tru", "EOF while parsing a value at line 1 column 3"),
    ]);
}

#[test]
fn test_parse_object() {
    let json = indoc! {r#"
        {
          "Name": "Ada",
          "Unknown": {"ignored": [1, 2, {"deep": null}]},
          "Age": 36,
          "Address": {"Street": "Main", "Zip": null},
          "Tags": {"math": true}
        }
    "#};
    let person: Person = from_str(json).unwrap();
    assert_eq!(person.name, "Ada");
    assert_eq!(person.age, 36);
    assert_eq!(person.address.street, "Main");
    assert_eq!(person.address.zip, None);
    assert_eq!(person.tags["math"], true);

    let written = to_string(&person).unwrap();
    assert_eq!(
        written,
        r#"{"Name":"Ada","Age":36,"Address":{"Street":"Main","Zip":null},"Tags":{"math":true}}"#
    );

    assert_eq!(to_string(&Empty {}).unwrap(), "{}");
    assert_eq!(from_str::<Empty>(r#"{"a":1}"#).unwrap(), Empty {});
    assert_eq!(from_str::<Address>("null").unwrap(), Address::default());
}

#[test]
fn test_recursive_type() {
    let json = r#"{"value":1,"children":[{"value":2,"children":[]},{"value":3,"children":[{"value":4,"children":[]}]}]}"#;
    let node: Node = from_str(json).unwrap();
    assert_eq!(node.children[1].children[0].value, 4);
    assert_eq!(to_string(&node).unwrap(), json);
}

#[test]
fn test_recursion_limit() {
    let options = JsonOptions::new().max_depth(2);
    assert_eq!(
        from_str_with::<Vec<Vec<u32>>>("[[1]]", &options).unwrap(),
        vec![vec![1]]
    );
    let err = from_str_with::<Vec<Vec<Vec<u32>>>>("[[[1]]]", &options).unwrap_err();
    assert_eq!(err.to_string(), "recursion limit exceeded at line 1 column 3");

    let depth = 80;
    let deep = format!("{}{}", r#"{"value":0,"children":["#.repeat(depth), "]}".repeat(depth));
    let err = from_str::<Node>(&deep).unwrap_err();
    assert!(err.is_syntax());

    let node: Node = from_str_with(&deep, &JsonOptions::new().disable_recursion_limit()).unwrap();
    assert_eq!(node.children.len(), 1);

    let mut nested = BTreeMap::new();
    nested.insert(1u8, BTreeMap::from([(2u8, 3u8)]));
    let err = to_vec_with(&nested, &JsonOptions::new().max_depth(1)).unwrap_err();
    assert!(err.to_string().contains("recursion limit exceeded"));
}

#[test]
fn test_return_graph() {
    let options = JsonOptions::new().include_return_graph(true);
    let json = r#"{"Name":"Bo","Address":{"Zip":90210},"Tags":{},"Other":1}"#;
    let (person, graph) = from_slice_with_graph::<Person>(json.as_bytes(), &options).unwrap();
    assert_eq!(person.address.zip, Some(90210));

    let graph = graph.unwrap();
    assert!(graph.has_member("Name"));
    assert!(graph.has_member("Tags"));
    assert!(!graph.has_member("Age"));
    assert!(!graph.has_member("Other"));

    let address = graph.child("Address").unwrap();
    assert!(address.has_member("Zip"));
    assert!(!address.has_member("Street"));

    // Without the option no graph is built.
    let (_, graph) =
        from_slice_with_graph::<Person>(json.as_bytes(), &JsonOptions::default()).unwrap();
    assert!(graph.is_none());

    // Dictionaries are not objects and carry no graph of their own.
    let (_, graph) =
        from_slice_with_graph::<HashMap<String, u8>>(br#"{"a":1}"#, &options).unwrap();
    assert!(graph.is_none());
}

#[test]
fn test_classify() {
    let registry = ConverterRegistry::global();
    assert_eq!(classify(&registry.type_detail::<u8>()), Shape::Scalar);
    assert_eq!(classify(&registry.type_detail::<Vec<u8>>()), Shape::Array);
    assert_eq!(classify(&registry.type_detail::<Person>()), Shape::Object);
    assert_eq!(
        classify(&registry.type_detail::<HashMap<String, u8>>()),
        Shape::DictionaryScalarKey
    );
    assert_eq!(
        classify(&registry.type_detail::<HashMap<Option<u8>, u8>>()),
        Shape::DictionaryComplexKey
    );
    assert_eq!(
        classify(&registry.type_detail::<BTreeMap<Vec<u8>, u8>>()),
        Shape::DictionaryComplexKey
    );
}

#[test]
fn test_nullable_keys_use_pairs() {
    let mut map = HashMap::new();
    map.insert(None, 0u8);
    let json = to_string(&map).unwrap();
    assert_eq!(json, r#"[{"Key":null,"Value":0}]"#);
    let back: HashMap<Option<u8>, u8> = from_str(&json).unwrap();
    assert_eq!(back, map);
}

/// Hands out its input a few bytes at a time, with interruptions.
struct Trickle<'a> {
    data: &'a [u8],
    calls: usize,
}

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.calls += 1;
        if self.calls % 3 == 0 {
            return Err(io::ErrorKind::Interrupted.into());
        }
        let n = buf.len().min(3).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

#[test]
fn test_from_reader() {
    let json = br#"{"x": [1, 2, 3], "y": []}"#;
    let map: BTreeMap<String, Vec<u8>> = from_reader(Trickle { data: json, calls: 0 }).unwrap();
    assert_eq!(map["x"], [1, 2, 3]);
    assert!(map["y"].is_empty());

    let options = JsonOptions::new().buffer_size(1);
    let map: BTreeMap<String, Vec<u8>> = from_reader_with(&json[..], &options).unwrap();
    assert_eq!(map.len(), 2);

    struct Broken;
    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "broken pipe"))
        }
    }
    let err = from_reader::<_, Vec<u8>>(Broken).unwrap_err();
    assert!(err.is_io());
}

#[test]
fn test_to_writer() {
    let mut map = BTreeMap::new();
    map.insert("k".to_owned(), vec![1u8, 2]);
    let mut out = Vec::new();
    to_writer(&mut out, &map).unwrap();
    assert_eq!(out, br#"{"k":[1,2]}"#);
}

#[test]
fn test_registry_reuses_converters() {
    let registry = ConverterRegistry::new();
    let first = registry.converter::<(), BTreeMap<String, Person>>();
    let second = registry.converter::<(), BTreeMap<String, Person>>();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(registry.len(), 1);
}
