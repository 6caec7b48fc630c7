use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use base64::Engine;
use chrono::{DateTime, NaiveDateTime, Utc};
use sha2::{Digest, Sha256};

use super::{ContentHandle, ExtensionSet, PreviewContent, Renderer};

const CERTIFICATE_EXTENSIONS: ExtensionSet = ExtensionSet::new(&["cer", "crt", "der", "pem"]);
const MAX_CERTIFICATE_BYTES: u64 = 1024 * 1024;

const TAG_INTEGER: u8 = 0x02;
const TAG_OID: u8 = 0x06;
const TAG_UTC_TIME: u8 = 0x17;
const TAG_GENERALIZED_TIME: u8 = 0x18;
const TAG_SEQUENCE: u8 = 0x30;
const TAG_SET: u8 = 0x31;
const TAG_EXPLICIT_VERSION: u8 = 0xA0;

#[derive(Debug, thiserror::Error)]
enum CertificateError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("file is larger than a certificate should be")]
    TooLarge,
    #[error("invalid PEM body: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("no certificate block found")]
    NoCertificate,
    #[error("malformed DER: {0}")]
    Malformed(&'static str),
}

/// X.509 certificates in PEM or DER form, summarized as labelled fields.
pub struct CertificateRenderer;

impl Renderer for CertificateRenderer {
    fn name(&self) -> &'static str {
        "certificate"
    }

    fn can_handle(&self, path: &Path) -> bool {
        CERTIFICATE_EXTENSIONS.matches(path)
    }

    fn render(&self, path: &Path) -> ContentHandle {
        let path = path.to_path_buf();
        ContentHandle::loading("Reading certificate", move || match describe(&path) {
            Ok(fields) => PreviewContent::Details {
                title: "Certificate Information".to_string(),
                fields,
            },
            Err(err) => PreviewContent::error(format!("Error loading certificate: {err}")),
        })
    }
}

fn describe(path: &Path) -> Result<Vec<(String, String)>, CertificateError> {
    if fs::metadata(path)?.len() > MAX_CERTIFICATE_BYTES {
        return Err(CertificateError::TooLarge);
    }
    let raw = fs::read(path)?;
    let der = match pem_certificate(&raw) {
        Some(body) => base64::engine::general_purpose::STANDARD.decode(body)?,
        None if raw.starts_with(b"-----BEGIN") => return Err(CertificateError::NoCertificate),
        None => raw,
    };
    let certificate = parse_certificate(&der)?;
    Ok(certificate.fields(&der, Utc::now()))
}

/// Base64 body of the first `CERTIFICATE` block, whitespace removed.
fn pem_certificate(raw: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(raw).ok()?;
    let start = text.find("-----BEGIN CERTIFICATE-----")?;
    let body_start = start + "-----BEGIN CERTIFICATE-----".len();
    let end = text[body_start..].find("-----END CERTIFICATE-----")? + body_start;
    Some(
        text[body_start..end]
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .collect(),
    )
}

struct DerReader<'a> {
    data: &'a [u8],
}

impl<'a> DerReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn peek_tag(&self) -> Option<u8> {
        self.data.first().copied()
    }

    fn read(&mut self) -> Result<(u8, &'a [u8]), CertificateError> {
        let (&tag, rest) = self
            .data
            .split_first()
            .ok_or(CertificateError::Malformed("unexpected end"))?;
        let (&first, mut rest) = rest
            .split_first()
            .ok_or(CertificateError::Malformed("missing length"))?;
        let len = if first & 0x80 == 0 {
            usize::from(first)
        } else {
            let count = usize::from(first & 0x7F);
            if count == 0 || count > 4 || rest.len() < count {
                return Err(CertificateError::Malformed("bad length"));
            }
            let len = rest[..count]
                .iter()
                .fold(0usize, |acc, byte| (acc << 8) | usize::from(*byte));
            rest = &rest[count..];
            len
        };
        if rest.len() < len {
            return Err(CertificateError::Malformed("truncated value"));
        }
        let (value, remaining) = rest.split_at(len);
        self.data = remaining;
        Ok((tag, value))
    }

    fn expect(&mut self, tag: u8, what: &'static str) -> Result<&'a [u8], CertificateError> {
        match self.read()? {
            (found, value) if found == tag => Ok(value),
            _ => Err(CertificateError::Malformed(what)),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Certificate {
    version: u8,
    serial: String,
    algorithm: String,
    issuer: String,
    subject: String,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

impl Certificate {
    fn fields(&self, der: &[u8], now: DateTime<Utc>) -> Vec<(String, String)> {
        let fingerprint = Sha256::digest(der)
            .iter()
            .fold(String::new(), |mut out, byte| {
                let _ = write!(out, "{byte:02X}");
                out
            });
        let mut fields = vec![
            ("Subject".to_string(), self.subject.clone()),
            ("Issuer".to_string(), self.issuer.clone()),
            ("Valid From".to_string(), format_time(self.not_before)),
            ("Valid To".to_string(), format_time(self.not_after)),
            ("Serial Number".to_string(), self.serial.clone()),
            ("SHA-256 Fingerprint".to_string(), fingerprint),
            ("Algorithm".to_string(), self.algorithm.clone()),
            ("Version".to_string(), self.version.to_string()),
        ];
        if now < self.not_before || now > self.not_after {
            fields.push((
                "Status".to_string(),
                "This certificate is expired or not yet valid.".to_string(),
            ));
        }
        fields
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn parse_certificate(der: &[u8]) -> Result<Certificate, CertificateError> {
    let certificate = DerReader::new(der).expect(TAG_SEQUENCE, "certificate")?;
    let mut tbs = DerReader::new(DerReader::new(certificate).expect(TAG_SEQUENCE, "tbs")?);

    let version = if tbs.peek_tag() == Some(TAG_EXPLICIT_VERSION) {
        let explicit = tbs.read()?.1;
        let value = DerReader::new(explicit).expect(TAG_INTEGER, "version")?;
        value.last().copied().unwrap_or(0).saturating_add(1)
    } else {
        1
    };
    let serial = tbs
        .expect(TAG_INTEGER, "serial")?
        .iter()
        .skip_while(|byte| **byte == 0)
        .fold(String::new(), |mut out, byte| {
            let _ = write!(out, "{byte:02X}");
            out
        });
    let algorithm = {
        let mut identifier = DerReader::new(tbs.expect(TAG_SEQUENCE, "signature")?);
        algorithm_name(&decode_oid(identifier.expect(TAG_OID, "algorithm")?))
    };
    let issuer = format_name(tbs.expect(TAG_SEQUENCE, "issuer")?)?;
    let mut validity = DerReader::new(tbs.expect(TAG_SEQUENCE, "validity")?);
    let not_before = parse_time(validity.read()?)?;
    let not_after = parse_time(validity.read()?)?;
    let subject = format_name(tbs.expect(TAG_SEQUENCE, "subject")?)?;

    Ok(Certificate {
        version,
        serial,
        algorithm,
        issuer,
        subject,
        not_before,
        not_after,
    })
}

fn parse_time((tag, value): (u8, &[u8])) -> Result<DateTime<Utc>, CertificateError> {
    let text = std::str::from_utf8(value).map_err(|_| CertificateError::Malformed("time"))?;
    let text = match tag {
        TAG_UTC_TIME => {
            // Two-digit years: 50..=99 are 19xx, 00..=49 are 20xx.
            let year: u8 = text
                .get(..2)
                .and_then(|digits| digits.parse().ok())
                .ok_or(CertificateError::Malformed("time"))?;
            let century = if year >= 50 { "19" } else { "20" };
            format!("{century}{text}")
        }
        TAG_GENERALIZED_TIME => text.to_string(),
        _ => return Err(CertificateError::Malformed("time tag")),
    };
    NaiveDateTime::parse_from_str(&text, "%Y%m%d%H%M%SZ")
        .map(|time| time.and_utc())
        .map_err(|_| CertificateError::Malformed("time"))
}

fn format_name(name: &[u8]) -> Result<String, CertificateError> {
    let mut parts = Vec::new();
    let mut rdns = DerReader::new(name);
    while rdns.peek_tag().is_some() {
        let mut set = DerReader::new(rdns.expect(TAG_SET, "relative name")?);
        while set.peek_tag().is_some() {
            let mut pair = DerReader::new(set.expect(TAG_SEQUENCE, "attribute")?);
            let oid = decode_oid(pair.expect(TAG_OID, "attribute type")?);
            let (_, value) = pair.read()?;
            let label = attribute_label(&oid).unwrap_or(oid.as_str()).to_string();
            parts.push(format!("{label}={}", String::from_utf8_lossy(value)));
        }
    }
    Ok(parts.join(", "))
}

fn decode_oid(bytes: &[u8]) -> String {
    let Some((&first, rest)) = bytes.split_first() else {
        return String::new();
    };
    let mut arcs = vec![u64::from(first / 40), u64::from(first % 40)];
    let mut current = 0u64;
    for byte in rest {
        current = (current << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            arcs.push(current);
            current = 0;
        }
    }
    arcs.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

fn attribute_label(oid: &str) -> Option<&'static str> {
    Some(match oid {
        "2.5.4.3" => "CN",
        "2.5.4.6" => "C",
        "2.5.4.7" => "L",
        "2.5.4.8" => "ST",
        "2.5.4.10" => "O",
        "2.5.4.11" => "OU",
        "1.2.840.113549.1.9.1" => "E",
        _ => return None,
    })
}

fn algorithm_name(oid: &str) -> String {
    match oid {
        "1.2.840.113549.1.1.5" => "sha1RSA",
        "1.2.840.113549.1.1.11" => "sha256RSA",
        "1.2.840.113549.1.1.12" => "sha384RSA",
        "1.2.840.113549.1.1.13" => "sha512RSA",
        "1.2.840.10045.4.3.2" => "sha256ECDSA",
        "1.2.840.10045.4.3.3" => "sha384ECDSA",
        "1.3.101.112" => "Ed25519",
        other => other,
    }
    .to_string()
}
