mod io;
mod read_meta;
