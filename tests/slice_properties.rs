use std::cmp::Ordering;

use quickcheck::{quickcheck, Arbitrary, Gen};

use vecbase::{memcompare, memequal, Slice, SliceInline};

/// Byte strings biased towards the lengths where representations change.
#[derive(Clone, Debug)]
struct Bytes(Vec<u8>);

impl Arbitrary for Bytes {
    fn arbitrary(g: &mut Gen) -> Self {
        let len = *g
            .choose(&[0usize, 1, 3, 4, 5, 11, 12, 13, 16, 17, 31, 64])
            .unwrap_or(&0);
        // A small alphabet makes shared prefixes likely.
        let alphabet = [0u8, b'A', b'B', 0xff];
        let bytes = (0..len)
            .map(|_| *g.choose(&alphabet).unwrap_or(&b'A'))
            .collect();
        Bytes(bytes)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        Box::new(self.0.shrink().map(Bytes))
    }
}

quickcheck! {
    fn prop_compare_matches_std_ordering(a: Bytes, b: Bytes) -> bool {
        memcompare(&a.0, &b.0) == a.0.cmp(&b.0)
    }

    fn prop_compare_is_antisymmetric(a: Bytes, b: Bytes) -> bool {
        let (sa, sb) = (Slice::new(&a.0), Slice::new(&b.0));
        sa.compare(&sb) == -sb.compare(&sa)
    }

    fn prop_equal_iff_compare_zero(a: Bytes, b: Bytes) -> bool {
        let (sa, sb) = (Slice::new(&a.0), Slice::new(&b.0));
        sa.equals(&sb) == (sa.compare(&sb) == 0)
    }

    fn prop_memequal_matches_slice_eq(a: Bytes, b: Bytes) -> bool {
        memequal(&a.0, &b.0) == (a.0 == b.0)
    }

    fn prop_inline_equality_matches_plain(a: Bytes, b: Bytes) -> bool {
        let plain = Slice::new(&a.0) == Slice::new(&b.0);
        let inline = SliceInline::new(&a.0) == SliceInline::new(&b.0);
        plain == inline
    }

    fn prop_inline_ordering_matches_plain(a: Bytes, b: Bytes) -> bool {
        let plain = Slice::new(&a.0).cmp(&Slice::new(&b.0));
        let inline = SliceInline::new(&a.0).cmp(&SliceInline::new(&b.0));
        plain == inline
    }

    fn prop_inline_round_trips(a: Bytes) -> bool {
        let view = SliceInline::new(&a.0);
        view.as_bytes() == a.0.as_slice()
            && view.len() == a.0.len()
            && view.is_inline() == (a.0.len() <= 12)
            && view.equals_slice(&Slice::new(&a.0))
    }

    fn prop_transitive_order(a: Bytes, b: Bytes, c: Bytes) -> bool {
        let (sa, sb, sc) = (Slice::new(&a.0), Slice::new(&b.0), Slice::new(&c.0));
        if sa <= sb && sb <= sc {
            sa <= sc
        } else {
            true
        }
    }
}

#[test]
fn test_empty_is_below_everything() {
    let empty = Slice::default();
    for other in [&b"\0"[..], &b"A"[..], &b"\xff\xff"[..]] {
        assert_eq!(empty.cmp(&Slice::new(other)), Ordering::Less);
        assert_eq!(SliceInline::new(b"").cmp(&SliceInline::new(other)), Ordering::Less);
    }
}
