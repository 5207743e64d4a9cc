pub mod codec;
pub mod commands;
pub mod packet;
pub mod records;
pub mod time;

pub use codec::ZkCodec;
pub use commands::CommandCode;
pub use packet::{Packet, checksum};
pub use records::{decode_attendance, decode_users, encode_attendance, encode_users};
pub use time::{decode_time, encode_time};
