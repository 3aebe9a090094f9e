//! Canonical SET OF ordering.

use pkpass::asn1::der::{encode, TAG_SET};
use pkpass::asn1::reader::parse_single;

fn elements() -> Vec<Vec<u8>> {
    vec![
        encode(|w| w.integer_u64(300)),
        encode(|w| w.octet_string(b"zz")),
        encode(|w| w.integer_u64(5)),
        encode(|w| w.sequence(|w| w.null())),
        encode(|w| w.octet_string(b"a")),
    ]
}

fn permutations(items: &[Vec<u8>]) -> Vec<Vec<Vec<u8>>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let first = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, first.clone());
            out.push(tail);
        }
    }
    out
}

#[test]
fn test_set_of_ignores_input_order() {
    let expected = encode(|w| w.set_of(elements()));
    let all = permutations(&elements());
    assert_eq!(all.len(), 120);
    for order in all {
        assert_eq!(encode(|w| w.set_of(order)), expected);
    }
}

#[test]
fn test_set_of_reparses_sorted() {
    let der = encode(|w| w.set_of(elements()));
    let set = parse_single(&der).unwrap();
    assert_eq!(set.tag, TAG_SET);

    let parsed: Vec<Vec<u8>> = set
        .children()
        .read_all()
        .unwrap()
        .into_iter()
        .map(|tlv| tlv.encoded.to_vec())
        .collect();

    let mut sorted = elements();
    sorted.sort();
    assert_eq!(parsed, sorted);
}

#[test]
fn test_implicit_set_of_sorts_too() {
    let der = encode(|w| w.implicit_set_of(0, elements()));
    let mut reversed = elements();
    reversed.reverse();
    assert_eq!(encode(|w| w.implicit_set_of(0, reversed)), der);
    assert_eq!(der[0], 0xA0);
}

#[test]
fn test_long_form_length() {
    let content = vec![0x55; 300];
    let der = encode(|w| w.octet_string(&content));
    assert_eq!(&der[..4], [0x04, 0x82, 0x01, 0x2C]);
    assert_eq!(parse_single(&der).unwrap().content, content.as_slice());
}
