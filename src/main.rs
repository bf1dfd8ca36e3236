fn main() {
    riposte::game::run();
}
