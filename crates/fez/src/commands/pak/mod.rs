pub mod list;
pub mod pack;
pub mod unpack;
pub mod unpack_game;

#[derive(clap::Subcommand)]
pub enum PakCommands {
    /// List the entries of a PAK archive
    List(list::ListArgs),
    /// Unpack a PAK archive into a directory
    Unpack(unpack::UnpackArgs),
    /// Unpack all archives of the game's Content directory
    UnpackGame(unpack_game::UnpackGameArgs),
    /// Pack a directory into a PAK archive
    Pack(pack::PackArgs),
}

impl PakCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            PakCommands::List(list) => list.handle(),
            PakCommands::Unpack(unpack) => unpack.handle(),
            PakCommands::UnpackGame(unpack_game) => unpack_game.handle(),
            PakCommands::Pack(pack) => pack.handle(),
        }
    }
}
