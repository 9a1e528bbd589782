//! Single-line transfer format for captured collision regions.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use rompilot_collision::{CollisionMap, MapReadError, TileEncoding};
use rompilot_core::{AreaId, GameMode, Regime, RoomId, TileBounds, TileCoord};
use thiserror::Error;

const CAPTURE_DOMAIN: &str = "cmap";
const CAPTURE_VERSION: &str = "v1";

/// Identifier prefix emitted before the capture fields.
pub(crate) const CAPTURE_HEADER: &str = "cmap:v1";
/// Delimiter separating the capture fields.
const FIELD_DELIMITER: char = ':';

/// Raw collision codes of a rectangular region, as read from memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MapCapture {
    /// Game mode the region was read under.
    pub(crate) mode: GameMode,
    /// Upper-left tile of the region.
    pub(crate) origin: TileCoord,
    /// Region width in tiles.
    pub(crate) width: u32,
    /// Region height in tiles.
    pub(crate) height: u32,
    /// Raw codes in row-major order.
    pub(crate) codes: Vec<u8>,
}

impl MapCapture {
    /// Regime the codes belong to.
    pub(crate) fn regime(&self) -> Result<Regime, MapTransferError> {
        self.mode
            .regime()
            .ok_or(MapTransferError::TransitionMode(self.mode))
    }

    /// Encodes the capture into a single-line string suitable for clipboard transfer.
    pub(crate) fn encode(&self) -> Result<String, MapTransferError> {
        let regime = self.regime()?;
        let encoded = STANDARD_NO_PAD.encode(&self.codes);
        Ok(format!(
            "{CAPTURE_HEADER}:{}:{:#04x}:{},{}:{}x{}:{encoded}",
            regime.name(),
            self.mode.get(),
            self.origin.x(),
            self.origin.y(),
            self.width,
            self.height
        ))
    }

    /// Decodes a capture from its string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, MapTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(MapTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(MapTransferError::MissingField("prefix"))?;
        let version = parts.next().ok_or(MapTransferError::MissingField("version"))?;
        let regime = parts.next().ok_or(MapTransferError::MissingField("regime"))?;
        let mode = parts.next().ok_or(MapTransferError::MissingField("mode"))?;
        let origin = parts.next().ok_or(MapTransferError::MissingField("origin"))?;
        let dimensions = parts
            .next()
            .ok_or(MapTransferError::MissingField("dimensions"))?;
        let payload = parts.next().ok_or(MapTransferError::MissingField("payload"))?;

        if domain != CAPTURE_DOMAIN {
            return Err(MapTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != CAPTURE_VERSION {
            return Err(MapTransferError::UnsupportedVersion(version.to_owned()));
        }

        let regime: Regime = regime
            .parse()
            .map_err(|_| MapTransferError::InvalidRegime(regime.to_owned()))?;
        let mode = parse_mode(mode)?;
        if mode.regime() != Some(regime) {
            return Err(MapTransferError::RegimeMismatch { regime, mode });
        }
        let origin = parse_origin(origin)?;
        let (width, height) = parse_dimensions(dimensions)?;
        let codes = STANDARD_NO_PAD.decode(payload.as_bytes())?;

        let expected = width as usize * height as usize;
        if codes.len() != expected {
            return Err(MapTransferError::CodeCount {
                expected,
                actual: codes.len(),
            });
        }

        Ok(Self {
            mode,
            origin,
            width,
            height,
            codes,
        })
    }

    /// Classifies the captured codes into a collision map.
    pub(crate) fn to_map(&self, encoding: &TileEncoding) -> Result<CollisionMap, MapReadError> {
        CollisionMap::from_codes(
            encoding,
            self.mode,
            AreaId::new(0),
            RoomId::new(0),
            TileBounds::new(self.origin, self.width, self.height),
            &self.codes,
        )
    }
}

/// Errors that can occur while encoding or decoding capture strings.
#[derive(Debug, Error)]
pub(crate) enum MapTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("capture string was empty")]
    EmptyPayload,
    /// A field was missing from the capture string.
    #[error("capture string is missing the {0}")]
    MissingField(&'static str),
    /// The capture used an unexpected prefix.
    #[error("capture prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The capture used an unsupported version identifier.
    #[error("capture version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The regime field was neither `overworld` nor `dungeon`.
    #[error("unknown regime '{0}'")]
    InvalidRegime(String),
    /// The mode field was not a byte.
    #[error("could not parse game mode '{0}'")]
    InvalidMode(String),
    /// The mode has no collision regime.
    #[error("game mode {0} is a transition mode")]
    TransitionMode(GameMode),
    /// The mode belongs to another regime than the one declared.
    #[error("game mode {mode} does not belong to the {regime} regime")]
    RegimeMismatch {
        /// Declared regime.
        regime: Regime,
        /// Declared mode.
        mode: GameMode,
    },
    /// The origin could not be parsed.
    #[error("could not parse origin '{0}'")]
    InvalidOrigin(String),
    /// The dimensions could not be parsed.
    #[error("could not parse region dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode capture payload: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    /// The payload does not cover the declared dimensions.
    #[error("expected {expected} codes but the payload holds {actual}")]
    CodeCount {
        /// Width times height.
        expected: usize,
        /// Decoded code count.
        actual: usize,
    },
}

/// Parses a game mode byte written in hex (`0x07`) or decimal.
pub(crate) fn parse_mode(value: &str) -> Result<GameMode, MapTransferError> {
    parse_byte(value)
        .map(GameMode::new)
        .ok_or_else(|| MapTransferError::InvalidMode(value.to_owned()))
}

/// Parses a byte written in hex (`0x40`) or decimal.
pub(crate) fn parse_byte(value: &str) -> Option<u8> {
    let value = value.trim();
    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

/// Parses an `x,y` tile coordinate.
pub(crate) fn parse_tile(value: &str) -> Option<TileCoord> {
    let (x, y) = value.split_once(',')?;
    Some(TileCoord::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
}

fn parse_origin(origin: &str) -> Result<TileCoord, MapTransferError> {
    parse_tile(origin).ok_or_else(|| MapTransferError::InvalidOrigin(origin.to_owned()))
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), MapTransferError> {
    let invalid = || MapTransferError::InvalidDimensions(dimensions.to_owned());
    let (width, height) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let width = width.trim().parse::<u32>().map_err(|_| invalid())?;
    let height = height.trim().parse::<u32>().map_err(|_| invalid())?;

    if width == 0 || height == 0 {
        return Err(invalid());
    }

    Ok((width, height))
}
