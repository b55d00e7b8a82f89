// Encoding utilities
//
// iTunes item atoms use Latin-1 four-character codes ("\xA9nam" is ©nam),
// while tag maps key them by their displayed text.

use encoding_rs::WINDOWS_1252;

/// Convert a tag key such as "©nam" into its four raw atom bytes.
///
/// Returns `None` if the key is not exactly four single-byte characters.
pub fn fourcc_from_key(key: &str) -> Option<[u8; 4]> {
    let (bytes, _, had_unmappable) = WINDOWS_1252.encode(key);
    if had_unmappable {
        return None;
    }
    <[u8; 4]>::try_from(bytes.as_ref()).ok()
}

/// Display form of a four-character code
pub fn key_from_fourcc(code: &[u8; 4]) -> String {
    WINDOWS_1252.decode_without_bom_handling(code).0.into_owned()
}
