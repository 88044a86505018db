// AST → LLVM IR lowering

use crate::codegen::errors::CodeGenError;
use crate::parser::ast::*;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::types::BasicMetadataTypeEnum;
use inkwell::values::{AnyValue, BasicMetadataValueEnum, BasicValue, FloatValue, FunctionValue};
use rustc_hash::FxHashMap;

/// Print one function the way it appears in the module dump
pub fn print_function(function: FunctionValue<'_>) -> String {
    function
        .print_to_string()
        .to_string()
        .trim_start_matches('\n')
        .to_string()
}

/// Lowers AST nodes into a growing LLVM [`Module`]
pub struct CodeGen<'ctx> {
    context: &'ctx Context,

    /// Every function declared or defined so far
    module: Module<'ctx>,

    builder: Builder<'ctx>,

    /// Parameters of the function currently being lowered.
    /// Rebuilt on entry to each function and cleared on exit.
    named_values: FxHashMap<String, FloatValue<'ctx>>,
}

impl<'ctx> CodeGen<'ctx> {
    pub fn new(context: &'ctx Context, module_id: &str) -> Self {
        CodeGen {
            context,
            module: context.create_module(module_id),
            builder: context.create_builder(),
            named_values: FxHashMap::default(),
        }
    }

    pub fn module(&self) -> &Module<'ctx> {
        &self.module
    }

    /// Textual IR of the whole module
    pub fn module_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    /// Drop a function from the module, e.g. an anonymous expression that
    /// has already been printed. Refuses a function that is still called.
    pub fn remove_function(&mut self, function: FunctionValue<'ctx>) -> bool {
        if is_called(function) {
            return false;
        }
        // SAFETY: no call site refers to `function` and the caller gives up
        // its handle.
        unsafe { function.delete() };
        true
    }

    /// Lower an expression into the current function
    pub fn lower_expr(&mut self, expr: &Expr) -> Result<FloatValue<'ctx>, CodeGenError> {
        match expr {
            Expr::Number(value, _) => Ok(self.context.f64_type().const_float(*value)),
            Expr::Variable(name, location) => {
                self.named_values
                    .get(name)
                    .copied()
                    .ok_or_else(|| CodeGenError::UnknownVariable {
                        name: name.clone(),
                        location: *location,
                    })
            }
            Expr::Binary {
                op,
                left,
                right,
                location,
            } => self.lower_binary(*op, left, right, *location),
            Expr::Call {
                callee,
                args,
                location,
            } => self.lower_call(callee, args, *location),
        }
    }

    fn lower_binary(
        &mut self,
        op: char,
        left: &Expr,
        right: &Expr,
        location: SourceLocation,
    ) -> Result<FloatValue<'ctx>, CodeGenError> {
        let lhs = self.lower_expr(left)?;
        let rhs = self.lower_expr(right)?;

        match op {
            '+' => Ok(self.builder.build_float_add(lhs, rhs, "addtmp")?),
            '-' => Ok(self.builder.build_float_sub(lhs, rhs, "subtmp")?),
            '*' => Ok(self.builder.build_float_mul(lhs, rhs, "multmp")?),
            '<' => {
                // No comparison is emitted: the left operand is converted
                // and the operator is then rejected like any other.
                self.builder
                    .build_float_cast(lhs, self.context.f64_type(), "booltmp")?;
                Err(CodeGenError::InvalidBinaryOperator { op, location })
            }
            _ => Err(CodeGenError::InvalidBinaryOperator { op, location }),
        }
    }

    fn lower_call(
        &mut self,
        callee: &str,
        args: &[Expr],
        location: SourceLocation,
    ) -> Result<FloatValue<'ctx>, CodeGenError> {
        let function =
            self.module
                .get_function(callee)
                .ok_or_else(|| CodeGenError::UnknownFunction {
                    name: callee.to_string(),
                    location,
                })?;

        let expected = function.count_params() as usize;
        if expected != args.len() {
            return Err(CodeGenError::ArgumentCountMismatch {
                function: callee.to_string(),
                expected,
                got: args.len(),
                location,
            });
        }

        let mut values: Vec<BasicMetadataValueEnum<'ctx>> = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.lower_expr(arg)?.into());
        }

        self.builder
            .build_call(function, &values, "calltmp")?
            .try_as_basic_value()
            .left()
            .map(|value| value.into_float_value())
            .ok_or_else(|| CodeGenError::Builder(format!("call to '{}' has no value", callee)))
    }

    /// Declare the prototype's function in the module.
    ///
    /// An existing function of the same arity is reused; a bodiless one
    /// takes the new parameter names. A different arity replaces an unused
    /// declaration and is rejected once the function has a body or callers.
    pub fn lower_prototype(&mut self, proto: &Prototype) -> Result<FunctionValue<'ctx>, CodeGenError> {
        log::debug!("declaring {}", proto);
        let arity = proto.params.len();

        if let Some(existing) = self.module.get_function(&proto.name) {
            let expected = existing.count_params() as usize;
            if expected == arity {
                if existing.count_basic_blocks() == 0 {
                    name_params(existing, &proto.params);
                }
                return Ok(existing);
            }
            if existing.count_basic_blocks() > 0 || is_called(existing) {
                return Err(CodeGenError::PrototypeMismatch {
                    name: proto.name.clone(),
                    expected,
                    got: arity,
                    location: proto.location,
                });
            }
            log::debug!("replacing unused declaration of '{}'", proto.name);
            // SAFETY: a bodiless function with no uses owns nothing and is
            // referenced by nothing.
            unsafe { existing.delete() };
        }

        let f64_type = self.context.f64_type();
        let param_types: Vec<BasicMetadataTypeEnum<'ctx>> = vec![f64_type.into(); arity];
        let function = self.module.add_function(
            &proto.name,
            f64_type.fn_type(&param_types, false),
            Some(Linkage::External),
        );
        name_params(function, &proto.params);
        Ok(function)
    }

    /// Lower a full definition.
    ///
    /// Reuses an existing declaration of the same name and rejects a name
    /// that already has a body. If the body fails to lower, a function that
    /// was declared beforehand goes back to being a declaration; one created
    /// here is removed again.
    pub fn lower_function(&mut self, def: &FunctionDef) -> Result<FunctionValue<'ctx>, CodeGenError> {
        let existing = self.module.get_function(&def.proto.name);
        let function = match existing {
            Some(function) => function,
            None => self.lower_prototype(&def.proto)?,
        };

        if function.count_basic_blocks() > 0 {
            return Err(CodeGenError::Redefinition {
                name: def.proto.name.clone(),
                location: def.proto.location,
            });
        }

        self.named_values.clear();
        for param in function.get_param_iter() {
            let value = param.into_float_value();
            let name = value.get_name().to_string_lossy().into_owned();
            self.named_values.insert(name, value);
        }

        let result = self.lower_body(function, &def.body);

        self.named_values.clear();
        self.builder.clear_insertion_position();

        match result {
            Ok(()) => {
                log::debug!("lowered {}", def);
                Ok(function)
            }
            Err(err) if existing.is_some() => {
                log::debug!(
                    "restoring declaration of '{}' after failed lowering: {}",
                    def.proto.name,
                    err
                );
                strip_body(function);
                Err(err)
            }
            Err(err) => {
                log::debug!("dropping '{}' after failed lowering: {}", def.proto.name, err);
                // SAFETY: the function was created above and only its own
                // body can refer to it; that body goes with it.
                unsafe { function.delete() };
                Err(err)
            }
        }
    }

    fn lower_body(&mut self, function: FunctionValue<'ctx>, body: &Expr) -> Result<(), CodeGenError> {
        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        let ret = self.lower_expr(body)?;
        self.builder.build_return(Some(&ret))?;

        if function.verify(false) {
            Ok(())
        } else {
            Err(CodeGenError::Verification {
                function: function.get_name().to_string_lossy().into_owned(),
            })
        }
    }
}

fn name_params(function: FunctionValue<'_>, names: &[String]) {
    // Clear first so a permutation of the old names is not uniqued
    for param in function.get_param_iter() {
        param.set_name("");
    }
    for (param, name) in function.get_param_iter().zip(names) {
        param.set_name(name);
    }
}

fn is_called(function: FunctionValue<'_>) -> bool {
    function
        .as_global_value()
        .as_pointer_value()
        .get_first_use()
        .is_some()
}

/// Turn a definition back into a declaration
fn strip_body(function: FunctionValue<'_>) {
    for block in function.get_basic_blocks() {
        // SAFETY: the blocks belong to `function`, which is not being lowered
        // into anymore.
        if unsafe { block.delete() }.is_err() {
            log::warn!("could not delete a block of '{}'", function.get_name().to_string_lossy());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::Parser;
    use expect_test::expect;

    fn define(codegen: &mut CodeGen, source: &str) -> Result<String, CodeGenError> {
        let def = Parser::new(source.chars())
            .parse_definition()
            .expect("Parsing failed");
        codegen.lower_function(&def).map(print_function)
    }

    fn declare(codegen: &mut CodeGen, source: &str) -> Result<String, CodeGenError> {
        let proto = Parser::new(source.chars())
            .parse_extern()
            .expect("Parsing failed");
        codegen.lower_prototype(&proto).map(print_function)
    }

    fn top_level(codegen: &mut CodeGen, source: &str) -> Result<String, CodeGenError> {
        let def = Parser::new(source.chars())
            .parse_top_level_expr()
            .expect("Parsing failed");
        codegen.lower_function(&def).map(print_function)
    }

    fn assert_module_verifies(codegen: &CodeGen) {
        for function in codegen.module().get_functions() {
            assert!(
                function.verify(false),
                "{} does not verify",
                function.get_name().to_string_lossy()
            );
        }
        assert!(codegen.module().verify().is_ok());
    }

    #[test]
    fn test_constants_fold() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        let ir = top_level(&mut codegen, "1+2*3").unwrap();

        expect![[r#"
            define double @0() {
            entry:
              ret double 7.000000e+00
            }
        "#]]
        .assert_eq(&ir);
    }

    #[test]
    fn test_define_function() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        let ir = define(&mut codegen, "def foo(a b) a*a + 2*a*b + b*b").unwrap();

        expect![[r#"
            define double @foo(double %a, double %b) {
            entry:
              %multmp = fmul double %a, %a
              %multmp1 = fmul double 2.000000e+00, %a
              %multmp2 = fmul double %multmp1, %b
              %addtmp = fadd double %multmp, %multmp2
              %multmp3 = fmul double %b, %b
              %addtmp4 = fadd double %addtmp, %multmp3
              ret double %addtmp4
            }
        "#]]
        .assert_eq(&ir);
    }

    #[test]
    fn test_call_extern() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        assert_eq!(
            declare(&mut codegen, "extern cos(x)").unwrap(),
            "declare double @cos(double)\n"
        );

        let ir = define(&mut codegen, "def f(x) cos(x)*cos(x)").unwrap();
        expect![[r#"
            define double @f(double %x) {
            entry:
              %calltmp = call double @cos(double %x)
              %calltmp1 = call double @cos(double %x)
              %multmp = fmul double %calltmp, %calltmp1
              ret double %multmp
            }
        "#]]
        .assert_eq(&ir);
    }

    #[test]
    fn test_unknown_variable() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        let err = define(&mut codegen, "def f(x) y").unwrap_err();

        assert!(matches!(err, CodeGenError::UnknownVariable { ref name, .. } if name == "y"));
        assert!(codegen.module().get_function("f").is_none());
    }

    #[test]
    fn test_unknown_function() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        let err = top_level(&mut codegen, "nope(1)").unwrap_err();

        assert!(matches!(err, CodeGenError::UnknownFunction { ref name, .. } if name == "nope"));
        assert!(codegen.module().get_first_function().is_none());
    }

    #[test]
    fn test_arity_mismatch_emits_no_call() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        define(&mut codegen, "def foo(a b) a+b").unwrap();

        let def = Parser::new("def g(x) x + foo(1,2,3)".chars())
            .parse_definition()
            .unwrap();
        let err = codegen.lower_function(&def).unwrap_err();

        assert_eq!(
            err,
            CodeGenError::ArgumentCountMismatch {
                function: "foo".to_string(),
                expected: 2,
                got: 3,
                location: SourceLocation::new(1, 14),
            }
        );
        assert!(codegen.module().get_function("g").is_none());
        assert!(!codegen.module_ir().contains("call"));
    }

    #[test]
    fn test_redefinition_is_rejected() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        let first = define(&mut codegen, "def foo(a) a").unwrap();

        let err = define(&mut codegen, "def foo(a) a+1").unwrap_err();
        assert!(matches!(err, CodeGenError::Redefinition { ref name, .. } if name == "foo"));

        let foo = codegen.module().get_function("foo").unwrap();
        assert_eq!(print_function(foo), first);
    }

    #[test]
    fn test_declaration_then_definition() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        declare(&mut codegen, "extern foo(a b)").unwrap();
        define(&mut codegen, "def foo(a b) a-b").unwrap();

        let foo = codegen.module().get_function("foo").unwrap();
        assert_eq!(foo.count_basic_blocks(), 1);
        assert_eq!(codegen.module().get_functions().count(), 1);
    }

    #[test]
    fn test_extern_after_definition_keeps_body() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        define(&mut codegen, "def foo(a b) a+b").unwrap();

        let ir = declare(&mut codegen, "extern foo(x y)").unwrap();
        assert!(ir.starts_with("define double @foo(double %a, double %b)"));

        let err = declare(&mut codegen, "extern foo(x)").unwrap_err();
        assert!(matches!(
            err,
            CodeGenError::PrototypeMismatch { expected: 2, got: 1, .. }
        ));
        assert_eq!(codegen.module().get_function("foo").unwrap().count_params(), 2);
    }

    #[test]
    fn test_unused_declaration_is_replaced() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        declare(&mut codegen, "extern h(x)").unwrap();

        let ir = declare(&mut codegen, "extern h(x y)").unwrap();
        assert_eq!(ir, "declare double @h(double, double)\n");
        assert_eq!(codegen.module().get_functions().count(), 1);
    }

    #[test]
    fn test_called_declaration_keeps_its_arity() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        declare(&mut codegen, "extern g(x)").unwrap();
        define(&mut codegen, "def f(a) g(a)").unwrap();

        let err = declare(&mut codegen, "extern g(x y)").unwrap_err();
        assert_eq!(
            err,
            CodeGenError::PrototypeMismatch {
                name: "g".to_string(),
                expected: 1,
                got: 2,
                location: SourceLocation::new(1, 8),
            }
        );
        assert_eq!(codegen.module().get_function("g").unwrap().count_params(), 1);
        assert_module_verifies(&codegen);
    }

    #[test]
    fn test_failed_body_restores_declaration() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        declare(&mut codegen, "extern g(x)").unwrap();
        define(&mut codegen, "def f(a) g(a)").unwrap();

        let err = define(&mut codegen, "def g(x) x < 1").unwrap_err();
        assert!(matches!(err, CodeGenError::InvalidBinaryOperator { op: '<', .. }));

        let g = codegen.module().get_function("g").unwrap();
        assert_eq!(print_function(g), "declare double @g(double)\n");
        assert_module_verifies(&codegen);

        // The declaration can still be defined afterwards.
        define(&mut codegen, "def g(x) x + 1").unwrap();
        assert_module_verifies(&codegen);
    }

    #[test]
    fn test_definition_uses_declared_parameter_names() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        declare(&mut codegen, "extern foo(x)").unwrap();

        let err = define(&mut codegen, "def foo(a) a").unwrap_err();
        assert!(matches!(err, CodeGenError::UnknownVariable { ref name, .. } if name == "a"));
        let foo = codegen.module().get_function("foo").unwrap();
        assert_eq!(foo.count_basic_blocks(), 0);
    }

    #[test]
    fn test_redeclaration_renames_parameters() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        declare(&mut codegen, "extern foo(a b)").unwrap();
        declare(&mut codegen, "extern foo(b a)").unwrap();

        let ir = define(&mut codegen, "def foo(b a) b - a").unwrap();
        assert!(ir.contains("%subtmp = fsub double %b, %a"));
    }

    #[test]
    fn test_less_than_is_rejected() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        let err = define(&mut codegen, "def lt(a b) a < b").unwrap_err();

        assert!(matches!(err, CodeGenError::InvalidBinaryOperator { op: '<', .. }));
        assert!(codegen.module().get_function("lt").is_none());
    }

    #[test]
    fn test_unsupported_operator() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        let expr = Expr::Binary {
            op: '/',
            left: Box::new(Expr::Number(1.0, SourceLocation::default())),
            right: Box::new(Expr::Number(2.0, SourceLocation::default())),
            location: SourceLocation::default(),
        };
        let def = FunctionDef::new(Prototype::anonymous(SourceLocation::default()), expr);

        let err = codegen.lower_function(&def).unwrap_err();
        assert!(matches!(err, CodeGenError::InvalidBinaryOperator { op: '/', .. }));
        assert!(codegen.module().get_first_function().is_none());
    }

    #[test]
    fn test_environment_does_not_leak_between_functions() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        define(&mut codegen, "def f(x) x").unwrap();

        let err = define(&mut codegen, "def g(y) x").unwrap_err();
        assert!(matches!(err, CodeGenError::UnknownVariable { ref name, .. } if name == "x"));
        assert!(codegen.named_values.is_empty());
    }

    #[test]
    fn test_duplicate_parameter_binds_first() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        let ir = define(&mut codegen, "def f(x x) x").unwrap();

        expect![[r#"
            define double @f(double %x, double %x1) {
            entry:
              ret double %x
            }
        "#]]
        .assert_eq(&ir);
    }

    #[test]
    fn test_recursive_call() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        let ir = define(&mut codegen, "def f(n) f(n-1)").unwrap();

        assert!(ir.contains("%calltmp = call double @f(double %subtmp)"));
    }

    #[test]
    fn test_anonymous_functions_are_removable() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        let def = Parser::new("4+5".chars()).parse_top_level_expr().unwrap();
        let function = codegen.lower_function(&def).unwrap();

        assert!(codegen.remove_function(function));
        assert!(codegen.module().get_first_function().is_none());
    }

    #[test]
    fn test_called_function_is_not_removed() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "test");
        define(&mut codegen, "def f(x) x").unwrap();
        define(&mut codegen, "def g(x) f(x)").unwrap();

        let f = codegen.module().get_function("f").unwrap();
        assert!(!codegen.remove_function(f));
        assert_module_verifies(&codegen);
    }
}
