use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use itertools::Itertools;

use crate::ast::{Variable, Sentence, Term, VarId};
use crate::compiler::{Program, Procedure, EmissionVerb, Test, ContNum};
use crate::machine::{Engine, Flow, Heap, TermId};

/// The storage of one procedure call
struct Frame<'p> {
    procedure: &'p Procedure,
    terms: HashMap<VarId, TermId>,
    conditions: Vec<Cell<bool>>,
    /// Where to go once this call has a solution. `None` for the query itself
    caller: Option<Continuation<'p>>,
}

#[derive(Clone)]
struct Continuation<'p> {
    frame: Rc<Frame<'p>>,
    next: ContNum,
}

/// Pending work, most urgent on top of the stack
enum Task<'p> {
    Run(Rc<Frame<'p>>, &'p EmissionVerb),
    /// Undo the last branch of a disjunction, then try the `next` one
    NextBranch {
        frame: Rc<Frame<'p>>,
        branches: &'p [EmissionVerb],
        next: usize,
    },
    Solution,
}

impl <'p> Frame<'p> {
    fn enter(procedure: &'p Procedure, args: &[TermId], caller: Option<Continuation<'p>>, heap: &mut Heap) -> Rc<Frame<'p>> {
        let mut terms = HashMap::with_capacity(args.len() + procedure.locals.len());
        for (param, arg) in procedure.params().iter().zip_eq(args) {
            terms.insert(param.id, *arg);
        }
        for local in procedure.locals.iter() {
            terms.insert(local.id, heap.make_variable(&local.name));
        }
        Rc::new(Frame {
            procedure,
            terms,
            conditions: vec![Cell::new(false); procedure.conditions],
            caller,
        })
    }
    fn term(&self, var: &Variable) -> TermId {
        *self.terms.get(&var.id)
            .expect("every variable of a procedure is a parameter or a local")
    }
}

impl Drop for Frame<'_> {
    /// Release the chain of callers one frame at a time, stopping at the first one still in use.
    /// The default drop would recurse once per frame of the call chain
    fn drop(&mut self) {
        let mut caller = self.caller.take();
        while let Some(continuation) = caller {
            match Rc::try_unwrap(continuation.frame) {
                Ok(mut frame) => caller = frame.caller.take(),
                Err(_) => break,
            }
        }
    }
}

/// Run `procedure` to exhaustion, or until the callback asks to stop.
/// Every choice point opened here is closed again before returning
pub(super) fn run<'p, F>(engine: &mut Engine<'p>, procedure: &'p Procedure, args: &[TermId], mut on_solution: F) -> usize
    where F: FnMut(&Engine<'p>) -> Flow
{
    let program = engine.program;
    let depth = engine.heap.choice_depth();
    let root = Frame::enter(procedure, args, None, &mut engine.heap);
    let mut tasks = vec![Task::Run(root, &procedure.body)];
    let mut solutions = 0;

    while let Some(task) = tasks.pop() {
        match task {
            Task::Run(frame, verb) => step(program, &mut engine.heap, &mut tasks, frame, verb),
            Task::NextBranch { frame, branches, next } => {
                engine.heap.restore_choice_point();
                match branches.get(next) {
                    Some(branch) => {
                        tasks.push(Task::NextBranch { frame: frame.clone(), branches, next: next + 1 });
                        tasks.push(Task::Run(frame, branch));
                    }
                    None => engine.heap.remove_choice_point(),
                }
            }
            Task::Solution => {
                solutions += 1;
                if let Flow::Stop = on_solution(&*engine) {
                    debug!("stopped after {} solution(s)", solutions);
                    engine.heap.unwind_to(depth);
                    break;
                }
            }
        }
    }
    debug_assert_eq!(engine.heap.choice_depth(), depth);
    solutions
}

fn step<'p>(program: &'p Program, heap: &mut Heap, tasks: &mut Vec<Task<'p>>, frame: Rc<Frame<'p>>, verb: &'p EmissionVerb) {
    match verb {
        EmissionVerb::Fail => {}
        EmissionVerb::Succeed(next) => resume(tasks, frame, *next),
        EmissionVerb::Call { next, sentence } => {
            let target = match program.procedure(sentence.name) {
                Some(target) if target.arity() == sentence.arity() => target,
                _ => {
                    trace!("{}: no procedure for {:?}, failing", sentence.context, sentence);
                    return;
                }
            };
            let args: Vec<TermId> = sentence.elements.iter()
                .map(|var| frame.term(var))
                .collect();
            let caller = Continuation { frame, next: *next };
            let callee = Frame::enter(target, &args, Some(caller), heap);
            tasks.push(Task::Run(callee, &target.body));
        }
        EmissionVerb::Conditional { next, test } => {
            if check(heap, &frame, test) {
                resume(tasks, frame, *next);
            }
        }
        EmissionVerb::Disjunction(branches) => {
            if let Some(first) = branches.first() {
                heap.new_choice_point();
                tasks.push(Task::NextBranch { frame: frame.clone(), branches: branches.as_slice(), next: 1 });
                tasks.push(Task::Run(frame, first));
            }
        }
        EmissionVerb::SetCondition(flag) => frame.conditions[*flag].set(true),
        EmissionVerb::ClearCondition(flag) => frame.conditions[*flag].set(false),
        EmissionVerb::Sequence(steps) => {
            for step in steps.iter().rev() {
                tasks.push(Task::Run(frame.clone(), step));
            }
        }
    }
}

/// Invoke continuation `next` of `frame`. Continuation 0 returns to the caller
fn resume<'p>(tasks: &mut Vec<Task<'p>>, frame: Rc<Frame<'p>>, next: ContNum) {
    let mut frame = frame;
    let mut next = next;
    while next == 0 {
        let caller = frame.caller.clone();
        match caller {
            Some(caller) => {
                frame = caller.frame;
                next = caller.next;
            }
            None => {
                tasks.push(Task::Solution);
                return;
            }
        }
    }
    let procedure: &'p Procedure = frame.procedure;
    let code = procedure.continuation(next)
        .expect("continuation ids are validated when the procedure is compiled");
    tasks.push(Task::Run(frame, code));
}

fn check(heap: &mut Heap, frame: &Frame<'_>, test: &Test) -> bool {
    match test {
        Test::Unify(left, right) => heap.unify(frame.term(left), frame.term(right)),
        Test::Structure(var, sentence) => {
            let model = build(heap, frame, sentence);
            heap.unify(frame.term(var), model)
        }
        Test::FlagClear(flag) => !frame.conditions[*flag].get(),
    }
}

/// Lay out a structure from clause text, reading its variables from the frame
fn build(heap: &mut Heap, frame: &Frame<'_>, sentence: &Sentence) -> TermId {
    let args = sentence.elements.iter()
        .map(|element| match element {
            Term::Variable(var) => frame.term(var),
            Term::Sentence(inner) => build(heap, frame, inner),
        })
        .collect();
    heap.make_template(sentence.name, args)
}
