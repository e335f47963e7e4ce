use crate::{GameLogic, HeadlessRunner};

/// Commands an external driver (editor, remote API, bot) can issue against a
/// running game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentCommand<I> {
    Step(I),
    StepMany(Vec<I>),
    Reset,
    GetState,
    GetHistory,
    Rewind { frames: usize },
    Forward { frames: usize },
    Seek { frame: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentResponse<S> {
    State { frame: usize, state: S },
    History { frame: usize, history: Vec<S> },
}

pub struct AgentHost<G>
where
    G: GameLogic + Clone,
{
    game: G,
    runner: HeadlessRunner<G>,
}

impl<G> AgentHost<G>
where
    G: GameLogic + Clone,
    G::State: Clone,
{
    pub fn new(game: G) -> Self {
        let runner = HeadlessRunner::new(game.clone());
        Self { game, runner }
    }

    pub fn handle(&mut self, command: AgentCommand<G::Input>) -> AgentResponse<G::State> {
        let frame = match command {
            AgentCommand::Step(input) => self.runner.step(input),
            AgentCommand::StepMany(inputs) => self.runner.run(inputs),
            AgentCommand::Reset => {
                self.runner = HeadlessRunner::new(self.game.clone());
                self.runner.frame()
            }
            AgentCommand::GetState => self.runner.frame(),
            AgentCommand::GetHistory => {
                return AgentResponse::History {
                    frame: self.runner.frame(),
                    history: self.runner.history().to_vec(),
                };
            }
            AgentCommand::Rewind { frames } => self.runner.rewind(frames),
            AgentCommand::Forward { frames } => self.runner.forward(frames),
            AgentCommand::Seek { frame } => self.runner.seek(frame),
        };

        AgentResponse::State {
            frame,
            state: self.runner.state().clone(),
        }
    }

    pub fn runner(&self) -> &HeadlessRunner<G> {
        &self.runner
    }
}
