//! Bitcoin transaction decoding and canonical serialization.
//!
//! Legacy layout:
//!
//! ```text
//! version | tx_in_count | tx_in* | tx_out_count | tx_out* | lock_time
//! ```
//!
//! Segwit layout:
//!
//! ```text
//! version | 0x00 0x01 | tx_in_count | tx_in* | tx_out_count | tx_out* | witness* | lock_time
//! ```
//!
//! The canonical bytes used for addressing are always the legacy layout, so
//! a transaction's address does not depend on its witness data.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::address::{Address, NodeKind};
use crate::cursor::Cursor;
use crate::error::{DagError, Result};
use crate::node::{link_at, parse_index, terminal, DagNode, Link, Node, Resolved};
use crate::varint::{read_count, read_var_bytes, write_var_bytes, write_varint};

/// Marker and flag bytes that introduce the segwit layout.
pub const SEGWIT_MARKER: [u8; 2] = [0x00, 0x01];

/// Smallest possible encodings, used to bound preallocation.
pub(crate) const MIN_TX_LEN: usize = 60;
const MIN_INPUT_LEN: usize = 41;
const MIN_OUTPUT_LEN: usize = 9;
const MIN_WITNESS_ITEM_LEN: usize = 1;

const TX_FIELDS: [&str; 4] = ["version", "lockTime", "inputs", "outputs"];
const INPUT_FIELDS: [&str; 3] = ["prevTx", "seqNo", "script"];
const OUTPUT_FIELDS: [&str; 2] = ["script", "value"];

/// A transaction input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    /// Address of the transaction holding the spent output.
    pub prev_tx: Address,
    /// Index of the spent output.
    pub prev_index: u32,
    /// Unlocking script, uninterpreted.
    pub script: Vec<u8>,
    pub sequence: u32,
}

impl TxInput {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        let prev_tx = cursor.read_array::<32>("prev_tx")?;
        let prev_index = cursor.read_u32_le("prev_index")?;
        let script = read_var_bytes(cursor, "script_sig")?.to_vec();
        let sequence = cursor.read_u32_le("sequence")?;

        Ok(TxInput {
            prev_tx: Address::from_digest(prev_tx, NodeKind::Tx),
            prev_index,
            script,
            sequence,
        })
    }

    fn write_to(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(self.prev_tx.digest());
        output.extend_from_slice(&self.prev_index.to_le_bytes());
        write_var_bytes(&self.script, output);
        output.extend_from_slice(&self.sequence.to_le_bytes());
    }
}

/// A transaction output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    /// Value in satoshis.
    pub value: u64,
    /// Locking script, uninterpreted.
    pub script: Vec<u8>,
}

impl TxOutput {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        let value = cursor.read_u64_le("value")?;
        let script = read_var_bytes(cursor, "script_pubkey")?.to_vec();
        Ok(TxOutput { value, script })
    }

    fn write_to(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.value.to_le_bytes());
        write_var_bytes(&self.script, output);
    }
}

/// The witness stack for one input.
///
/// Empty items are kept as empty vectors; they are meaningful stack slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Witness {
    pub items: Vec<Vec<u8>>,
}

impl Witness {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        let count = read_count(cursor, "witness_count")?;
        let mut items = Vec::with_capacity(cursor.capacity_hint(count, MIN_WITNESS_ITEM_LEN));
        for _ in 0..count {
            items.push(read_var_bytes(cursor, "witness_item")?.to_vec());
        }
        Ok(Witness { items })
    }

    fn write_to(&self, output: &mut Vec<u8>) {
        write_varint(self.items.len() as u64, output);
        for item in &self.items {
            write_var_bytes(item, output);
        }
    }
}

/// A decoded Bitcoin transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: u32,
    /// One witness per input, present only if the segwit layout was decoded.
    pub witnesses: Option<Vec<Witness>>,
}

impl Transaction {
    /// Read one transaction from the cursor.
    pub fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        let version = cursor.read_u32_le("version")?;

        let segwit = cursor.peek(SEGWIT_MARKER.len()) == Some(&SEGWIT_MARKER[..]);
        if segwit {
            read_segwit_marker(cursor)?;
        }

        let inputs = read_inputs(cursor)?;
        let outputs = read_outputs(cursor)?;

        // witness_count is implicit: one per input
        let witnesses = if segwit {
            Some(read_witnesses(cursor, inputs.len())?)
        } else {
            None
        };

        let lock_time = cursor.read_u32_le("lock_time")?;

        Ok(Transaction {
            version,
            inputs,
            outputs,
            lock_time,
            witnesses,
        })
    }

    /// Whether this transaction was decoded from the segwit layout.
    pub fn is_segwit(&self) -> bool {
        self.witnesses.is_some()
    }

    /// Canonical legacy serialization, the input to the transaction address.
    pub fn serialize(&self) -> Vec<u8> {
        let mut raw_tx = Vec::with_capacity(self.estimated_size());

        // Version (4 bytes, little-endian)
        raw_tx.extend_from_slice(&self.version.to_le_bytes());

        self.write_body(&mut raw_tx);

        // Locktime (4 bytes)
        raw_tx.extend_from_slice(&self.lock_time.to_le_bytes());

        raw_tx
    }

    /// Full wire serialization, including marker, flag and witnesses when present.
    pub fn serialize_with_witness(&self) -> Vec<u8> {
        let Some(witnesses) = &self.witnesses else {
            return self.serialize();
        };

        let mut raw_tx = Vec::with_capacity(self.estimated_size() + 2);
        raw_tx.extend_from_slice(&self.version.to_le_bytes());
        raw_tx.extend_from_slice(&SEGWIT_MARKER);
        self.write_body(&mut raw_tx);
        for witness in witnesses {
            witness.write_to(&mut raw_tx);
        }
        raw_tx.extend_from_slice(&self.lock_time.to_le_bytes());
        raw_tx
    }

    fn write_body(&self, output: &mut Vec<u8>) {
        write_varint(self.inputs.len() as u64, output);
        for input in &self.inputs {
            input.write_to(output);
        }

        write_varint(self.outputs.len() as u64, output);
        for tx_out in &self.outputs {
            tx_out.write_to(output);
        }
    }

    fn estimated_size(&self) -> usize {
        let inputs: usize = self.inputs.iter().map(|i| 41 + i.script.len()).sum();
        let outputs: usize = self.outputs.iter().map(|o| 9 + o.script.len()).sum();
        8 + 18 + inputs + outputs
    }

    fn tree_inputs(&self, out: &mut Vec<String>, depth: usize) {
        if depth < 2 {
            return;
        }
        for i in 0..self.inputs.len() {
            let base = format!("inputs/{i}");
            if depth > 2 {
                out.push(base.clone());
                out.extend(INPUT_FIELDS.iter().map(|f| format!("{base}/{f}")));
            } else {
                out.push(base);
            }
        }
    }

    fn tree_outputs(&self, out: &mut Vec<String>, depth: usize) {
        if depth < 2 {
            return;
        }
        for i in 0..self.outputs.len() {
            let base = format!("outputs/{i}");
            if depth > 2 {
                out.push(base.clone());
                out.extend(OUTPUT_FIELDS.iter().map(|f| format!("{base}/{f}")));
            } else {
                out.push(base);
            }
        }
    }
}

fn read_segwit_marker(cursor: &mut Cursor<'_>) -> Result<()> {
    let offset = cursor.position();
    let [marker, flag] = cursor.read_array::<2>("segwit_marker")?;
    if [marker, flag] != SEGWIT_MARKER {
        return Err(DagError::InvalidSegwitMarker {
            offset,
            marker,
            flag,
        });
    }
    Ok(())
}

fn read_inputs(cursor: &mut Cursor<'_>) -> Result<Vec<TxInput>> {
    let count = read_count(cursor, "tx_in_count")?;
    let mut inputs = Vec::with_capacity(cursor.capacity_hint(count, MIN_INPUT_LEN));
    for _ in 0..count {
        inputs.push(TxInput::decode(cursor)?);
    }
    Ok(inputs)
}

fn read_outputs(cursor: &mut Cursor<'_>) -> Result<Vec<TxOutput>> {
    let count = read_count(cursor, "tx_out_count")?;
    let mut outputs = Vec::with_capacity(cursor.capacity_hint(count, MIN_OUTPUT_LEN));
    for _ in 0..count {
        outputs.push(TxOutput::decode(cursor)?);
    }
    Ok(outputs)
}

fn read_witnesses(cursor: &mut Cursor<'_>, count: usize) -> Result<Vec<Witness>> {
    let mut witnesses = Vec::with_capacity(count);
    for _ in 0..count {
        witnesses.push(Witness::decode(cursor)?);
    }
    Ok(witnesses)
}

impl DagNode for Transaction {
    fn kind(&self) -> NodeKind {
        NodeKind::Tx
    }

    fn raw_data(&self) -> Vec<u8> {
        self.serialize()
    }

    fn links(&self) -> Vec<Link> {
        self.inputs
            .iter()
            .enumerate()
            .map(|(i, input)| Link::named(format!("inputs/{i}/prevTx"), input.prev_tx))
            .collect()
    }

    fn resolve<'p>(&self, path: &'p [&'p str]) -> Result<(Resolved, &'p [&'p str])> {
        let Some(first) = path.first() else {
            return Err(DagError::path_not_found(path, "zero length path"));
        };

        match *first {
            "version" => terminal(Resolved::U32(self.version), path, 1),
            "lockTime" => terminal(Resolved::U32(self.lock_time), path, 1),
            "inputs" => {
                if path.len() == 1 {
                    return Ok((Resolved::Inputs(self.inputs.clone()), &path[1..]));
                }

                let index = parse_index(path, 1, self.inputs.len())?;
                let input = &self.inputs[index];
                let Some(field) = path.get(2) else {
                    return Ok((Resolved::Input(input.clone()), &path[2..]));
                };

                match *field {
                    "prevTx" => link_at(
                        Link::named(format!("inputs/{index}/prevTx"), input.prev_tx),
                        path,
                        3,
                    ),
                    "seqNo" => terminal(Resolved::U32(input.sequence), path, 3),
                    "script" => terminal(Resolved::Bytes(input.script.clone()), path, 3),
                    _ => Err(DagError::path_not_found(path, "no such link")),
                }
            }
            "outputs" => {
                if path.len() == 1 {
                    return Ok((Resolved::Outputs(self.outputs.clone()), &path[1..]));
                }

                let index = parse_index(path, 1, self.outputs.len())?;
                let tx_out = &self.outputs[index];
                let Some(field) = path.get(2) else {
                    return Ok((Resolved::Output(tx_out.clone()), &path[2..]));
                };

                match *field {
                    "value" => terminal(Resolved::U64(tx_out.value), path, 3),
                    "script" => terminal(Resolved::Bytes(tx_out.script.clone()), path, 3),
                    _ => Err(DagError::path_not_found(path, "no such link")),
                }
            }
            _ => Err(DagError::path_not_found(path, "no such link")),
        }
    }

    fn tree(&self, path: &str, depth: usize) -> Vec<String> {
        if depth == 0 {
            return Vec::new();
        }

        let mut out = Vec::new();
        match path {
            "inputs" => self.tree_inputs(&mut out, depth + 1),
            "outputs" => self.tree_outputs(&mut out, depth + 1),
            "" => {
                out.extend(TX_FIELDS.iter().map(|f| f.to_string()));
                self.tree_inputs(&mut out, depth);
                self.tree_outputs(&mut out, depth);
            }
            _ => {}
        }
        out
    }

    fn copy(&self) -> Node {
        Node::Transaction(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::parse_path;

    // Legacy coinbase transaction.
    const COINBASE_HEX: &str = "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff6403a6ab05e4b883e5bda9e7a59ee4bb99e9b1bc76a3a2bb0e9c92f06e4a6349de9ccc8fbe0fad11133ed73c78ee12876334c13c02000000f09f909f2f4249503130302f4d696e65642062792073647a6861626364000000000000000000000000000000005f77dba4015ca34297000000001976a914c825a1ecf2a6830c4401620c3a16f1995057c2ab88acfe75853a";

    // BIP-143 native P2WPKH example.
    const P2WPKH_HEX: &str = "01000000000102fff7f7881a8099afa6940d42d1e7f6362bec38171ea3edf433541db4e4ad969f00000000494830450221008b9d1dc26ba6a9cb62127b02742fa9d754cd3bebf337f7a55d114c8e5cdd30be022040529b194ba3f9281a99f2b1c0a19c0489bc22ede944ccf4ecbab4cc618ef3ed01eeffffffef51e1b804cc89d182d279655c3aa89e815b1b309fe287d9b2b55d57b90ec68a0100000000ffffffff02202cb206000000001976a9148280b37df378db99f66f85c95a783a76ac7a6d5988ac9093510d000000001976a9143bde42dbee7e4dbe6a21b2d50ce2f0167faa815988ac000247304402203609e17b84f6a7d30c80bfa610b5b4542f32a8a0d5447a12fb1366d7f01cc44a0220573a954c4518331561406f90300e8f3358f51928d43c212a8caed02de67eebee0121025476c2e83188368da1ff3e292e7acafcdb3566bb0ad253f62fc70f07aeee635711000000";

    // The same transaction with marker, flag and witnesses stripped.
    const P2WPKH_LEGACY_HEX: &str = "0100000002fff7f7881a8099afa6940d42d1e7f6362bec38171ea3edf433541db4e4ad969f00000000494830450221008b9d1dc26ba6a9cb62127b02742fa9d754cd3bebf337f7a55d114c8e5cdd30be022040529b194ba3f9281a99f2b1c0a19c0489bc22ede944ccf4ecbab4cc618ef3ed01eeffffffef51e1b804cc89d182d279655c3aa89e815b1b309fe287d9b2b55d57b90ec68a0100000000ffffffff02202cb206000000001976a9148280b37df378db99f66f85c95a783a76ac7a6d5988ac9093510d000000001976a9143bde42dbee7e4dbe6a21b2d50ce2f0167faa815988ac11000000";

    // Segwit transaction whose single witness is [<empty>, abcd, <empty>].
    const EMPTY_ITEM_HEX: &str = "0200000000010111111111111111111111111111111111111111111111111111111111111111110000000000feffffff0150c3000000000000025152030002abcd0000000000";

    fn decode_hex(s: &str) -> Transaction {
        let raw = hex::decode(s).unwrap();
        let mut cursor = Cursor::new(&raw);
        let tx = Transaction::decode(&mut cursor).unwrap();
        assert!(cursor.is_empty());
        tx
    }

    #[test]
    fn test_decode_coinbase() {
        let tx = decode_hex(COINBASE_HEX);

        assert!(!tx.is_segwit());
        assert_eq!(tx.lock_time, 981825022);
        assert_eq!(tx.inputs.len(), 1);
        assert_eq!(tx.inputs[0].sequence, 2765846367);
        assert_eq!(tx.inputs[0].prev_index, 0xffffffff);
        assert_eq!(tx.inputs[0].prev_tx.digest(), &[0u8; 32]);
        assert_eq!(tx.outputs.len(), 1);
    }

    #[test]
    fn test_legacy_roundtrip() {
        let raw = hex::decode(COINBASE_HEX).unwrap();
        let tx = decode_hex(COINBASE_HEX);

        assert_eq!(tx.serialize(), raw);
        assert_eq!(decode_hex(&hex::encode(tx.serialize())), tx);
        assert_eq!(tx.address(), tx.address());
        assert_eq!(tx.size(), raw.len());
    }

    #[test]
    fn test_decode_bip143_p2wpkh() {
        let tx = decode_hex(P2WPKH_HEX);

        assert_eq!(tx.version, 1);
        assert_eq!(tx.inputs.len(), 2);
        assert_eq!(tx.outputs.len(), 2);
        assert_eq!(tx.lock_time, 17);

        let witnesses = tx.witnesses.as_ref().unwrap();
        assert_eq!(witnesses.len(), 2);
        assert!(witnesses[0].items.is_empty());
        assert_eq!(
            hex::encode(&witnesses[1].items[0]),
            "304402203609e17b84f6a7d30c80bfa610b5b4542f32a8a0d5447a12fb1366d7f01cc44a0220573a954c4518331561406f90300e8f3358f51928d43c212a8caed02de67eebee01"
        );
        assert_eq!(
            hex::encode(&witnesses[1].items[1]),
            "025476c2e83188368da1ff3e292e7acafcdb3566bb0ad253f62fc70f07aeee6357"
        );
    }

    #[test]
    fn test_segwit_address_ignores_witness() {
        let segwit = decode_hex(P2WPKH_HEX);
        let legacy = decode_hex(P2WPKH_LEGACY_HEX);

        assert_eq!(segwit.serialize(), hex::decode(P2WPKH_LEGACY_HEX).unwrap());
        assert_eq!(segwit.address(), legacy.address());
        assert_eq!(
            segwit.display_hex(),
            "e8151a2af31c368a35053ddd4bdb285a8595c769a3ad83e0fa02314a602d4609"
        );

        let mut other = segwit.clone();
        other.witnesses = Some(vec![Witness::default(), Witness { items: vec![vec![0x01]] }]);
        assert_eq!(other.address(), segwit.address());
    }

    #[test]
    fn test_wire_serialization_keeps_witness() {
        let raw = hex::decode(P2WPKH_HEX).unwrap();
        let tx = decode_hex(P2WPKH_HEX);
        assert_eq!(tx.serialize_with_witness(), raw);
    }

    #[test]
    fn test_empty_witness_items_are_present() {
        let tx = decode_hex(EMPTY_ITEM_HEX);

        let witness = &tx.witnesses.as_ref().unwrap()[0];
        assert_eq!(witness.items.len(), 3);
        assert!(witness.items[0].is_empty());
        assert_eq!(witness.items[1], vec![0xab, 0xcd]);
        assert!(witness.items[2].is_empty());

        assert_eq!(tx.serialize_with_witness(), hex::decode(EMPTY_ITEM_HEX).unwrap());
        assert_eq!(
            hex::encode(tx.address().digest()),
            "91cf1431b7fba3b2c13bba7c8e5ece315cd834c7807b34d8e115c9c5a3dabf5c"
        );
    }

    #[test]
    fn test_truncated_transaction() {
        let raw = hex::decode(COINBASE_HEX).unwrap();
        let err = Transaction::decode(&mut Cursor::new(&raw[..raw.len() - 2])).unwrap_err();
        assert!(matches!(err, DagError::TruncatedInput { field: "lock_time", .. }));

        let err = Transaction::decode(&mut Cursor::new(&raw[..50])).unwrap_err();
        assert!(matches!(err, DagError::TruncatedInput { field: "script_sig", .. }));

        let raw = hex::decode(P2WPKH_HEX).unwrap();
        let err = Transaction::decode(&mut Cursor::new(&raw[..raw.len() - 10])).unwrap_err();
        assert!(matches!(err, DagError::TruncatedInput { field: "witness_item", .. }));
    }

    #[test]
    fn test_oversized_counts() {
        // version, then an input count of u64::MAX
        let mut raw = vec![0x01, 0x00, 0x00, 0x00];
        raw.extend_from_slice(&[0xff; 9]);
        let err = Transaction::decode(&mut Cursor::new(&raw)).unwrap_err();
        assert_eq!(
            err,
            DagError::MalformedCount {
                field: "tx_in_count",
                offset: 4,
                value: u64::MAX,
            }
        );

        // addressable but far more outputs than bytes left
        let mut raw = vec![0x01, 0x00, 0x00, 0x00, 0x00];
        raw.extend_from_slice(&[0xfe, 0xff, 0xff, 0xff, 0xff]);
        raw.extend_from_slice(&[0u8; 20]);
        let err = Transaction::decode(&mut Cursor::new(&raw)).unwrap_err();
        assert!(matches!(err, DagError::TruncatedInput { field: "value", offset: 28, .. }));
    }

    #[test]
    fn test_segwit_marker_check() {
        let bytes = [0x00, 0x02];
        let err = read_segwit_marker(&mut Cursor::new(&bytes)).unwrap_err();
        assert_eq!(
            err,
            DagError::InvalidSegwitMarker {
                offset: 0,
                marker: 0x00,
                flag: 0x02,
            }
        );
        assert!(read_segwit_marker(&mut Cursor::new(&SEGWIT_MARKER)).is_ok());
    }

    #[test]
    fn test_resolve_paths() {
        let tx = decode_hex(P2WPKH_HEX);

        let path = parse_path("inputs/0/seqNo");
        assert_eq!(tx.resolve(&path).unwrap().0, Resolved::U32(0xffffffee));

        let path = parse_path("version");
        assert_eq!(tx.resolve(&path).unwrap().0, Resolved::U32(1));

        let path = parse_path("lockTime");
        assert_eq!(tx.resolve(&path).unwrap().0, Resolved::U32(17));

        let path = parse_path("outputs/1/value");
        assert_eq!(tx.resolve(&path).unwrap().0, Resolved::U64(223_450_000));

        let path = parse_path("outputs/0/script");
        let (value, _) = tx.resolve(&path).unwrap();
        assert_eq!(value, Resolved::Bytes(tx.outputs[0].script.clone()));

        let path = parse_path("inputs");
        assert_eq!(tx.resolve(&path).unwrap().0, Resolved::Inputs(tx.inputs.clone()));

        let path = parse_path("outputs/1");
        assert_eq!(tx.resolve(&path).unwrap().0, Resolved::Output(tx.outputs[1].clone()));

        let path = parse_path("inputs/1/prevTx/lockTime");
        let (link, rest) = tx.resolve_link(&path).unwrap();
        assert_eq!(link.address, tx.inputs[1].prev_tx);
        assert_eq!(link.name.as_deref(), Some("inputs/1/prevTx"));
        assert_eq!(rest, &["lockTime"]);
    }

    #[test]
    fn test_resolve_rejects_bad_paths() {
        let tx = decode_hex(P2WPKH_HEX);

        for bad in [
            "inputs/99/seqNo",
            "inputs/x/seqNo",
            "inputs/0/bogus",
            "outputs/2",
            "outputs/0/value/extra",
            "witnesses",
        ] {
            let path = parse_path(bad);
            assert!(
                matches!(tx.resolve(&path), Err(DagError::PathNotFound { .. })),
                "{bad} should not resolve"
            );
        }
    }

    #[test]
    fn test_links() {
        let tx = decode_hex(P2WPKH_HEX);
        let links = tx.links();

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].name.as_deref(), Some("inputs/0/prevTx"));
        assert_eq!(links[1].address, tx.inputs[1].prev_tx);
    }

    #[test]
    fn test_tree_depths() {
        let tx = decode_hex(P2WPKH_HEX);

        assert!(tx.tree("", 0).is_empty());
        assert_eq!(tx.tree("", 1), vec!["version", "lockTime", "inputs", "outputs"]);

        let shallow = tx.tree("", 2);
        assert_eq!(shallow.len(), 4 + 2 + 2);
        assert!(shallow.contains(&"inputs/1".to_string()));
        assert!(!shallow.contains(&"inputs/1/seqNo".to_string()));

        let deep = tx.tree("", 3);
        assert_eq!(deep.len(), 4 + 2 * 4 + 2 * 3);
        assert!(deep.contains(&"inputs/0/prevTx".to_string()));
        assert!(deep.contains(&"outputs/1/value".to_string()));

        assert_eq!(tx.tree("inputs", 1), vec!["inputs/0", "inputs/1"]);
        assert_eq!(tx.tree("outputs", 2).len(), 2 * 3);
        assert!(tx.tree("version", 5).is_empty());
    }
}
