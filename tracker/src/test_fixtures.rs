use crate::units::Timestamp;
use indoc::indoc;
use isstypes::prelude::TleRecord;

pub const ISS_TLE: &str = indoc! {"
    ISS (ZARYA)
    1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927
    2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537
"};

pub fn iss() -> TleRecord {
    tleparse::parse_named_tle(ISS_TLE, Some("ISS (ZARYA)")).unwrap()
}

pub fn iss_epoch() -> Timestamp {
    Timestamp::from_utc(iss().epoch)
}
