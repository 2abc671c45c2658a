fn main() -> eyre::Result<()> {
    thumbinfo::main()
}
