use indoc::indoc;
use resumable_json::{
    from_str, json_object, to_vec, try_read, try_write, JsonOptions, JsonReader, JsonWriter,
    ReadDriver, ReadState, WriteDriver, WriteState,
};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Point {
    x: i32,
    y: i32,
}

json_object!(Point { x as "X", y as "Y" });

#[derive(Clone, Debug, Default, PartialEq)]
struct Inventory {
    owner: String,
    counts: BTreeMap<String, u32>,
    located: BTreeMap<Point, Vec<Option<String>>>,
    ratio: f64,
}

json_object!(Inventory { owner as "Owner", counts as "Counts", located as "Located", ratio });

fn inventory() -> Inventory {
    let mut counts = BTreeMap::new();
    counts.insert("apples".to_owned(), 3);
    counts.insert("pears \u{1F350}".to_owned(), 12);
    let mut located = BTreeMap::new();
    located.insert(Point { x: 1, y: -2 }, vec![Some("a\"b".to_owned()), None]);
    located.insert(Point { x: 0, y: 0 }, Vec::new());
    Inventory {
        owner: "Zoë".to_owned(),
        counts,
        located,
        ratio: 0.25,
    }
}

/// Reads `data` split into chunks of every size from 1 to its length and
/// checks each result against the whole-input read.
#[rustfmt::skip]
macro_rules! test_chunked_read {
    ($data:expr, $ty:ty) => {
        {
            let data: &[u8] = $data.as_ref();
            let whole: $ty = resumable_json::from_slice(data).unwrap();
            for size in 1..=data.len() {
                let mut driver = ReadDriver::<$ty>::new();
                for chunk in data.chunks(size) {
                    driver.feed(chunk).unwrap();
                }
                assert_eq!(driver.finish().unwrap(), whole, "chunk size {}", size);
            }
            whole
        }
    };
}

/// Writes `value` through output buffers of every size from 1 to 32 and
/// checks that the concatenated chunks match a single-buffer write.
#[rustfmt::skip]
macro_rules! test_chunked_write {
    ($value:expr) => {
        {
            let value = &$value;
            let whole = to_vec(value).unwrap();
            for size in 1..=32 {
                let mut driver = WriteDriver::new(value, size);
                let mut out = Vec::new();
                while let Some(chunk) = driver.next_chunk().unwrap() {
                    out.extend_from_slice(chunk);
                }
                assert_eq!(
                    String::from_utf8_lossy(&out),
                    String::from_utf8_lossy(&whole),
                    "buffer size {}",
                    size
                );
            }
            whole
        }
    };
}

#[test]
fn test_chunked_scalar_dictionary() {
    let map = test_chunked_read!(br#"{"1":"a","2":"b","3":"c"}"#, BTreeMap<u32, String>);
    assert_eq!(map.len(), 3);
    assert_eq!(map[&3], "c");

    let json = test_chunked_write!(map);
    assert_eq!(json, br#"{"1":"a","2":"b","3":"c"}"#);
}

#[test]
fn test_chunked_escapes() {
    let json = r#"{"tab\there":"\u00e9\ud83d\ude00","\\":"\/"}"#;
    let map = test_chunked_read!(json, HashMap<String, String>);
    assert_eq!(map["tab\there"], "é😀");
    assert_eq!(map["\\"], "/");
}

#[test]
fn test_chunked_pairs() {
    let json = indoc! {r#"
        [
          {"Key": {"X": 1, "Y": 2}, "Value": [true, false]},
          {"Value": [], "Key": {"Y": -5}}
        ]
    "#};
    let map = test_chunked_read!(json, BTreeMap<Point, Vec<bool>>);
    assert_eq!(map[&Point { x: 1, y: 2 }], [true, false]);
    assert!(map[&Point { x: 0, y: -5 }].is_empty());

    test_chunked_write!(map);
}

#[test]
fn test_chunked_nested() {
    let json = indoc! {r#"
        {
          "Owner": "Zo\u00eb",
          "Counts": {"apples": 3, "pears 🍐": 12},
          "Located": [
            {"Key": {"X": 0, "Y": 0}, "Value": []},
            {"Key": {"X": 1, "Y": -2}, "Value": ["a\"b", null]}
          ],
          "ratio": 2.5e-1
        }
    "#};
    let value = test_chunked_read!(json, Inventory);
    assert_eq!(value, inventory());

    let written = test_chunked_write!(inventory());
    let back: Inventory = resumable_json::from_slice(&written).unwrap();
    assert_eq!(back, inventory());
}

#[test]
fn test_chunked_mismatch_drain() {
    let options = JsonOptions::new().error_on_type_mismatch(false);
    let data = br#"[{"a":1}, "skip me", [[{"x":[]}]], {"b":2}]"#;
    for size in 1..=data.len() {
        let mut driver = ReadDriver::<Vec<HashMap<String, u8>>>::with_options(&options);
        for chunk in data.chunks(size) {
            driver.feed(chunk).unwrap();
        }
        let maps = driver.finish().unwrap();
        assert_eq!(maps.len(), 4, "chunk size {}", size);
        assert_eq!(maps[0]["a"], 1);
        assert!(maps[1].is_empty());
        assert!(maps[2].is_empty());
        assert_eq!(maps[3]["b"], 2);
    }
}

#[test]
fn test_try_read_by_hand() {
    let mut state = ReadState::new();

    // The string token is cut off: nothing of it is consumed.
    let mut reader = JsonReader::new(br#"{"first":1,"sec"#, false);
    let first = try_read::<HashMap<String, u8>>(&mut reader, &mut state).unwrap();
    assert_eq!(first, None);
    assert_eq!(reader.remaining(), br#""sec"#);
    assert!(state.pending_frames() > 0);
    assert!(state.chars_needed() >= 1);

    let rest = [reader.remaining(), br#"ond":2}"#].concat();
    let mut reader = JsonReader::new(&rest, true);
    let map = try_read::<HashMap<String, u8>>(&mut reader, &mut state).unwrap().unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map["second"], 2);
    assert_eq!(state.pending_frames(), 0);
}

#[test]
fn test_number_waits_for_final_block() {
    let mut state = ReadState::new();
    let mut reader = JsonReader::new(b"12", false);
    assert_eq!(try_read::<u32>(&mut reader, &mut state).unwrap(), None);
    assert_eq!(reader.consumed(), 0);

    let mut reader = JsonReader::new(b"12", true);
    assert_eq!(try_read::<u32>(&mut reader, &mut state).unwrap(), Some(12));
}

#[test]
fn test_eof_in_final_block() {
    let mut driver = ReadDriver::<BTreeMap<String, u8>>::new();
    driver.feed(br#"{"a":1"#).unwrap();
    assert!(!driver.is_complete());
    let err = driver.finish().unwrap_err();
    assert!(err.is_eof());

    let err = from_str::<Vec<u8>>("[1,").unwrap_err();
    assert!(err.is_eof());
}

#[test]
fn test_empty_map_into_tiny_buffer() {
    let map = HashMap::<String, u8>::new();
    let mut state = WriteState::new();

    let mut buffer = [0u8; 1];
    let mut writer = JsonWriter::new(&mut buffer);
    assert!(!try_write(&mut writer, &mut state, &map).unwrap());
    assert_eq!(writer.written(), 0);
    assert_eq!(state.pending_frames(), 0);
    assert_eq!(state.size_needed(), 2);

    let mut buffer = [0u8; 2];
    let mut writer = JsonWriter::new(&mut buffer);
    assert!(try_write(&mut writer, &mut state, &map).unwrap());
    assert_eq!(writer.as_bytes(), b"{}");
    assert_eq!(state.pending_frames(), 0);
}

#[test]
fn test_try_write_resumes_mid_dictionary() {
    let mut map = BTreeMap::new();
    map.insert("alpha".to_owned(), 1u64);
    map.insert("beta".to_owned(), 22);
    map.insert("gamma".to_owned(), 333);

    let mut state = WriteState::new();
    let mut out = Vec::new();
    let mut buffer = [0u8; 10];
    let mut rounds = 0;
    loop {
        let mut writer = JsonWriter::new(&mut buffer);
        let done = try_write(&mut writer, &mut state, &map).unwrap();
        out.extend_from_slice(writer.as_bytes());
        rounds += 1;
        if done {
            break;
        }
        assert!(state.pending_frames() > 0);
    }
    assert!(rounds > 1);
    assert_eq!(out, br#"{"alpha":1,"beta":22,"gamma":333}"#);
    assert_eq!(state.pending_frames(), 0);
}

#[test]
fn test_write_grows_for_long_token() {
    let mut map = BTreeMap::new();
    map.insert("k".to_owned(), "x".repeat(40));
    let mut driver = WriteDriver::new(&map, 4);
    let mut sizes = Vec::new();
    let mut out = Vec::new();
    while let Some(chunk) = driver.next_chunk().unwrap() {
        sizes.push(chunk.len());
        out.extend_from_slice(chunk);
    }
    assert!(sizes.iter().any(|&size| size > 4));
    assert_eq!(out, to_vec(&map).unwrap());
}
